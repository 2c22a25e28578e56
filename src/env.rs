use crate::error::{Result, ShellError};
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Process state the shell tracks between lines.
///
/// The environment contains:
/// - `current_dir`: the working directory shown in the prompt.
/// - `should_exit`: set once the exit directive was read.
#[derive(Debug, Clone)]
pub struct Environment {
    /// The working directory of the shell process, absolute.
    pub current_dir: PathBuf,
    /// When set to true, the read loop stops after the current line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the working directory of the current process.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            should_exit: false,
        }
    }

    /// Change the working directory of the shell process itself.
    ///
    /// Relative targets resolve against the current directory, exactly as
    /// `chdir` does.
    pub fn change_dir(&mut self, target: &Path) -> Result<()> {
        stdenv::set_current_dir(target).map_err(|source| ShellError::ChangeDir {
            path: target.to_path_buf(),
            source,
        })?;
        self.refresh();
        Ok(())
    }

    /// Re-read the working directory from the process.
    pub fn refresh(&mut self) {
        if let Ok(dir) = stdenv::current_dir() {
            self.current_dir = dir;
        }
    }

    /// `<absolute-cwd><suffix>`, with no trailing space.
    pub fn prompt(&self, suffix: &str) -> String {
        format!("{}{}", self.current_dir.display(), suffix)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CwdGuard, process_lock};

    #[test]
    fn test_env_reads_process_cwd() {
        let _lock = process_lock();
        let env = Environment::new();
        assert_eq!(env.current_dir, stdenv::current_dir().unwrap());
        assert!(!env.should_exit);
    }

    #[test]
    fn test_change_dir_updates_prompt() {
        let _lock = process_lock();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let canonical = tmp.path().canonicalize().unwrap();

        let mut env = Environment::new();
        env.change_dir(tmp.path()).unwrap();
        assert_eq!(env.current_dir, canonical);
        assert_eq!(env.prompt("$"), format!("{}$", canonical.display()));
    }

    #[test]
    fn test_change_dir_to_missing_directory_fails() {
        let _lock = process_lock();
        let mut env = Environment::new();
        let before = env.current_dir.clone();
        let err = env
            .change_dir(Path::new("/definitely/not/here/4711"))
            .unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir { .. }));
        assert_eq!(env.current_dir, before);
    }
}
