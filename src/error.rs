//! Error taxonomy of the shell.
//!
//! Errors raised inside a forked child never reach this type: the child
//! reports them itself and exits. Everything here is observed by the shell
//! process, and [`ShellError::is_fatal`] tells the read loop whether to
//! report and continue or to stop.

use nix::errno::Errno;
use std::io;
use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Process creation failed; there is no fallback.
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    /// Reaping a child failed.
    #[error("wait failed: {0}")]
    Wait(#[source] Errno),

    /// A pipe between two pipeline stages could not be created.
    #[error("pipe creation failed: {0}")]
    Pipe(#[source] Errno),

    /// `> file` with nothing to run in front of it.
    #[error("missing command before '>'")]
    MissingRedirectCommand,

    /// `cmd >` with no file name after it.
    #[error("missing redirection target after '>'")]
    MissingRedirectTarget,

    #[error("pipeline has {stages} stages, at most {max} are supported")]
    TooManyStages { stages: usize, max: usize },

    /// A word that cannot be passed to exec.
    #[error("argument contains a NUL byte: {0:?}")]
    InvalidArgument(String),

    #[error("cd: {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    /// Fatal errors terminate the shell; everything else is reported and the
    /// read loop moves on to the next line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Fork(_) | ShellError::Wait(_))
    }
}
