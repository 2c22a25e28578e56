use crate::error::{Result, ShellError};
use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, pipe};
use std::ffi::CString;
use std::fs::File;
use std::io::Write;
use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

/// Both ends of one pipe between adjacent pipeline stages.
#[derive(Debug)]
pub struct PipeEndpoint {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl PipeEndpoint {
    pub fn open() -> Result<Self> {
        let (read, write) = pipe().map_err(ShellError::Pipe)?;
        Ok(Self { read, write })
    }
}

/// Where a child's standard output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Keep the shell's standard output.
    Inherit,
    /// Write end of a pipe owned by the parent.
    Fd(RawFd),
    /// File created (or truncated) by the child before exec.
    File(CString),
}

/// Descriptor rewiring applied by a child between fork and exec.
///
/// The plan only holds raw descriptor numbers and pre-built strings so that
/// applying it does not allocate; the parent keeps ownership of every
/// descriptor and closes its copies on its own schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioPlan {
    stdin: Option<RawFd>,
    stdout: StdoutTarget,
    close: Vec<RawFd>,
}

/// A child could not set up its descriptors. The diagnostic has already been
/// written to stderr.
#[derive(Debug)]
pub struct ChildSetupFailed;

/// Permission bits of a redirection target: rw-r--r--.
fn redirect_mode() -> Mode {
    Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH
}

impl StdioPlan {
    /// Inherit all three standard streams untouched.
    pub fn inherit() -> Self {
        Self {
            stdin: None,
            stdout: StdoutTarget::Inherit,
            close: Vec::new(),
        }
    }

    /// Send standard output to `path`, created or truncated by the child.
    pub fn to_file(path: &str) -> Result<Self> {
        let path =
            CString::new(path).map_err(|_| ShellError::InvalidArgument(path.to_string()))?;
        Ok(Self {
            stdout: StdoutTarget::File(path),
            ..Self::inherit()
        })
    }

    /// Wiring of one pipeline stage.
    ///
    /// `upstream` is the read end left over from the previous stage, absent for
    /// the first stage. `downstream` is the pipe towards the next stage, absent
    /// for the last one. The child closes the read end of `downstream` since
    /// only the next stage reads from it.
    pub fn pipeline_stage(upstream: Option<&OwnedFd>, downstream: Option<&PipeEndpoint>) -> Self {
        let mut plan = Self::inherit();
        plan.stdin = upstream.map(AsRawFd::as_raw_fd);
        if let Some(pipe) = downstream {
            plan.close.push(pipe.read.as_raw_fd());
            plan.stdout = StdoutTarget::Fd(pipe.write.as_raw_fd());
        }
        plan
    }

    pub fn stdin(&self) -> Option<RawFd> {
        self.stdin
    }

    pub fn stdout(&self) -> &StdoutTarget {
        &self.stdout
    }

    /// Rewire the calling process. Only ever called in a forked child.
    pub(crate) fn apply(&self) -> std::result::Result<(), ChildSetupFailed> {
        for &fd in &self.close {
            close(fd).map_err(|errno| report_setup_error(b"close", errno))?;
        }

        if let Some(fd) = self.stdin {
            move_fd(fd, STDIN_FILENO)?;
        }

        match &self.stdout {
            StdoutTarget::Inherit => {}
            StdoutTarget::Fd(fd) => move_fd(*fd, STDOUT_FILENO)?,
            StdoutTarget::File(path) => {
                let flags = OFlag::O_CREAT | OFlag::O_WRONLY | OFlag::O_TRUNC;
                let fd = open(path.as_c_str(), flags, redirect_mode())
                    .map_err(|errno| report_setup_error(path.as_bytes(), errno))?;
                move_fd(fd, STDOUT_FILENO)?;
            }
        }
        Ok(())
    }
}

/// Duplicate `fd` onto `target` and close the original.
fn move_fd(fd: RawFd, target: RawFd) -> std::result::Result<(), ChildSetupFailed> {
    if fd == target {
        return Ok(());
    }
    dup2(fd, target).map_err(|errno| report_setup_error(b"dup2", errno))?;
    close(fd).map_err(|errno| report_setup_error(b"close", errno))?;
    Ok(())
}

fn report_setup_error(what: &[u8], errno: Errno) -> ChildSetupFailed {
    child_report(&[b"shell: ", what, b": ", errno.desc().as_bytes(), b"\n"]);
    ChildSetupFailed
}

/// Write a diagnostic from a forked child.
///
/// Goes straight to descriptor 2: no allocation and no stream lock, either of
/// which may be held by a thread that does not exist in the child.
pub(crate) fn child_report(parts: &[&[u8]]) {
    // SAFETY: descriptor 2 stays open; ManuallyDrop keeps it that way.
    let mut stderr = ManuallyDrop::new(unsafe { File::from_raw_fd(STDERR_FILENO) });
    for part in parts {
        let _ = stderr.write_all(part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::process_lock;

    #[test]
    fn test_inherit_plan_touches_nothing() {
        let plan = StdioPlan::inherit();
        assert_eq!(plan.stdin(), None);
        assert_eq!(plan.stdout(), &StdoutTarget::Inherit);
        assert!(plan.close.is_empty());
    }

    #[test]
    fn test_file_plan_keeps_path() {
        let plan = StdioPlan::to_file("out.txt").unwrap();
        assert_eq!(plan.stdout(), &StdoutTarget::File(c"out.txt".to_owned()));
        assert!(StdioPlan::to_file("bad\0name").is_err());
    }

    #[test]
    fn test_pipeline_stage_wiring() {
        let _lock = process_lock();
        let first = PipeEndpoint::open().unwrap();
        let second = PipeEndpoint::open().unwrap();

        let head = StdioPlan::pipeline_stage(None, Some(&first));
        assert_eq!(head.stdin(), None);
        assert_eq!(head.stdout(), &StdoutTarget::Fd(first.write.as_raw_fd()));
        assert_eq!(head.close, vec![first.read.as_raw_fd()]);

        let middle = StdioPlan::pipeline_stage(Some(&first.read), Some(&second));
        assert_eq!(middle.stdin(), Some(first.read.as_raw_fd()));
        assert_eq!(middle.stdout(), &StdoutTarget::Fd(second.write.as_raw_fd()));
        assert_eq!(middle.close, vec![second.read.as_raw_fd()]);

        let tail = StdioPlan::pipeline_stage(Some(&second.read), None);
        assert_eq!(tail.stdin(), Some(second.read.as_raw_fd()));
        assert_eq!(tail.stdout(), &StdoutTarget::Inherit);
        assert!(tail.close.is_empty());
    }
}
