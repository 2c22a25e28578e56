use crate::error::{Result, ShellError};
use nix::sys::wait::WaitStatus;
use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::ptr;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Program name plus positional arguments, ready to be handed to `execvp`.
///
/// The vector is built in the shell process before forking. Together with
/// [`ArgumentVector::exec_pointers`], also taken before the fork, the child
/// has nothing left to allocate between fork and exec. It is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    args: Vec<CString>,
}

impl ArgumentVector {
    /// Build a vector from whitespace-split words.
    ///
    /// Returns `None` for an empty word list and an error if a word carries an
    /// interior NUL byte, which exec cannot represent.
    pub fn new<I, S>(words: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = words
            .into_iter()
            .map(|word| {
                let word = word.into();
                CString::new(word.as_bytes()).map_err(|_| ShellError::InvalidArgument(word))
            })
            .collect::<Result<Vec<_>>>()?;

        if args.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self { args }))
        }
    }

    /// Name of the executable, looked up on `PATH` by exec.
    pub fn program(&self) -> &CStr {
        &self.args[0]
    }

    /// Every argument including the program name, in `argv` order.
    pub fn as_slice(&self) -> &[CString] {
        &self.args
    }

    /// NULL-terminated `argv` array for `execvp(3)`.
    ///
    /// The pointers borrow from `self`; the array must not outlive it.
    pub(crate) fn exec_pointers(&self) -> Vec<*const c_char> {
        self.args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a reaped child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// Normal exit with the given code.
    Exited(ExitCode),
    /// Killed by the given signal number.
    Signaled(i32),
}

impl ChildStatus {
    pub fn success(&self) -> bool {
        matches!(self, ChildStatus::Exited(0))
    }

    /// Convert a terminal wait status. Stop and continue notifications are not
    /// terminations and yield `None`.
    pub(crate) fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(ChildStatus::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ChildStatus::Signaled(signal as i32)),
            _ => None,
        }
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStatus::Exited(code) => write!(f, "Command exited with status {code}"),
            ChildStatus::Signaled(signal) => write!(f, "Command terminated by signal {signal}"),
        }
    }
}
