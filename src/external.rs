use crate::command::{ArgumentVector, ChildStatus};
use crate::error::{Result, ShellError};
use crate::io_adapters::{StdioPlan, child_report};
use crate::signals::restore_default_signals;
use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork};
use std::ffi::c_char;
use tracing::debug;

/// Exit status of a child whose exec failed (command not found, not executable).
pub const EXEC_FAILED: i32 = 127;

/// Exit status of a child that could not set up its descriptors.
pub const SETUP_FAILED: i32 = 1;

/// Retry a system call interrupted by a signal.
fn syscall<F, T>(f: F) -> nix::Result<T>
where
    F: Fn() -> nix::Result<T>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => continue,
            result => return result,
        }
    }
}

/// Fork a child that runs `argv` with its descriptors wired per `stdio`.
///
/// The program is looked up on `PATH`. The parent gets the child's pid back
/// and is responsible for reaping it. The child never returns: it either
/// becomes `argv` or reports the failure and exits non-zero.
pub fn spawn(argv: &ArgumentVector, stdio: &StdioPlan) -> Result<Pid> {
    let exec_argv = argv.exec_pointers();
    // SAFETY: the child only calls async-signal-safe functions before exec or _exit.
    match syscall(|| unsafe { fork() }).map_err(ShellError::Fork)? {
        ForkResult::Parent { child } => {
            debug!(pid = child.as_raw(), command = %argv, "spawned");
            Ok(child)
        }
        ForkResult::Child => run_child(argv, &exec_argv, stdio),
    }
}

/// Terminate a forked child without running exit handlers or flushing the
/// stdio buffers it inherited from the shell.
fn exit_child(code: i32) -> ! {
    // SAFETY: _exit only ends the calling process.
    unsafe { libc::_exit(code) }
}

fn run_child(argv: &ArgumentVector, exec_argv: &[*const c_char], stdio: &StdioPlan) -> ! {
    if let Err(errno) = restore_default_signals() {
        child_report(&[b"shell: signal: ", errno.desc().as_bytes(), b"\n"]);
        exit_child(SETUP_FAILED);
    }
    if stdio.apply().is_err() {
        exit_child(SETUP_FAILED);
    }

    // SAFETY: `exec_argv` is NULL-terminated and points into `argv`, which is
    // alive for the whole call.
    unsafe { libc::execvp(argv.program().as_ptr(), exec_argv.as_ptr()) };
    let errno = Errno::last();
    child_report(&[
        b"shell: ",
        argv.program().to_bytes(),
        b": ",
        errno.desc().as_bytes(),
        b"\n",
    ]);
    exit_child(EXEC_FAILED)
}

/// Block until `pid` terminates and return how it ended.
pub fn wait(pid: Pid) -> Result<ChildStatus> {
    loop {
        let status = syscall(|| waitpid(pid, None)).map_err(ShellError::Wait)?;
        if let Some(status) = ChildStatus::from_wait_status(status) {
            debug!(pid = pid.as_raw(), ?status, "reaped");
            return Ok(status);
        }
    }
}

/// Reap every pid in `children`, in the given order.
///
/// Completion order does not matter: a child that finished early is simply
/// collected when its turn comes. Stops at the first wait failure.
pub fn wait_all(children: &[Pid]) -> Result<Vec<ChildStatus>> {
    children.iter().map(|&pid| wait(pid)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::process_lock;

    fn argv(words: &[&str]) -> ArgumentVector {
        ArgumentVector::new(words.iter().copied()).unwrap().unwrap()
    }

    #[test]
    fn test_spawn_and_wait_reports_exit_code() {
        let _lock = process_lock();
        let pid = spawn(&argv(&["sh", "-c", "exit 3"]), &StdioPlan::inherit()).unwrap();
        assert_eq!(wait(pid).unwrap(), ChildStatus::Exited(3));
    }

    #[test]
    fn test_unknown_program_exits_127() {
        let _lock = process_lock();
        let pid = spawn(
            &argv(&["definitely-not-a-real-command-4711"]),
            &StdioPlan::inherit(),
        )
        .unwrap();
        assert_eq!(wait(pid).unwrap(), ChildStatus::Exited(EXEC_FAILED));
    }

    #[test]
    fn test_signal_termination_is_reported() {
        let _lock = process_lock();
        let pid = spawn(&argv(&["sh", "-c", "kill -9 $$"]), &StdioPlan::inherit()).unwrap();
        assert_eq!(wait(pid).unwrap(), ChildStatus::Signaled(9));
    }

    #[test]
    fn test_wait_all_collects_every_child() {
        let _lock = process_lock();
        let pids = vec![
            spawn(&argv(&["sleep", "0.2"]), &StdioPlan::inherit()).unwrap(),
            spawn(&argv(&["true"]), &StdioPlan::inherit()).unwrap(),
            spawn(&argv(&["false"]), &StdioPlan::inherit()).unwrap(),
        ];
        let statuses = wait_all(&pids).unwrap();
        assert_eq!(
            statuses,
            vec![
                ChildStatus::Exited(0),
                ChildStatus::Exited(0),
                ChildStatus::Exited(1)
            ]
        );
    }

    #[test]
    fn test_child_gets_default_interrupt_disposition() {
        let _lock = process_lock();
        crate::signals::ignore_interactive_signals().unwrap();
        let pid = spawn(&argv(&["sh", "-c", "kill -INT $$; exit 0"]), &StdioPlan::inherit());
        crate::signals::restore_default_signals().unwrap();

        assert_eq!(wait(pid.unwrap()).unwrap(), ChildStatus::Signaled(2));
    }

    #[test]
    fn test_waiting_twice_fails() {
        let _lock = process_lock();
        let pid = spawn(&argv(&["true"]), &StdioPlan::inherit()).unwrap();
        wait(pid).unwrap();
        assert!(matches!(wait(pid), Err(ShellError::Wait(Errno::ECHILD))));
    }
}
