use crate::error::Result;
use std::fs::{File, OpenOptions, TryLockError};
use std::path::Path;
use tracing::debug;

/// Exclusive advisory lock held for the lifetime of the process.
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
}

impl InstanceLock {
    /// Try to take the lock at `path` without blocking.
    ///
    /// Returns `Ok(None)` if another process holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked for a
    /// reason other than contention.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        match file.try_lock() {
            Ok(()) => {
                debug!("Acquired instance lock {:?}", path);
                Ok(Some(Self { _file: file }))
            }
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(e)) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let first = InstanceLock::try_acquire(&path).unwrap();
        assert!(first.is_some());
        assert!(InstanceLock::try_acquire(&path).unwrap().is_none());

        drop(first);
        assert!(InstanceLock::try_acquire(&path).unwrap().is_some());
    }
}
