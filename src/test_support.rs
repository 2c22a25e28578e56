use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that fork children or change the working directory.
///
/// Both are process-wide: a concurrent test could otherwise leak its pipe
/// descriptors into our children or move the directory under our feet.
pub(crate) fn process_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Restores the working directory when dropped.
pub(crate) struct CwdGuard(std::path::PathBuf);

impl CwdGuard {
    pub(crate) fn new() -> Self {
        Self(std::env::current_dir().expect("cwd"))
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}
