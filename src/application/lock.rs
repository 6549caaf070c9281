//! Process-wide store lock.
//!
//! One reader/writer lock guards the whole record store. Trades, resolutions
//! and admin mutations take the exclusive side for their full duration; reads
//! share. Acquisition is bounded by a timeout so a stuck writer cannot wedge
//! every caller forever.

use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::error::{Error, Result};

/// Default time to wait for the lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared guard; released on drop.
pub type ReadGuard<'a> = RwLockReadGuard<'a, ()>;

/// Exclusive guard; released on drop.
pub type WriteGuard<'a> = RwLockWriteGuard<'a, ()>;

/// Coarse reader/writer lock over the record store.
#[derive(Debug)]
pub struct StoreLock {
    inner: RwLock<()>,
    timeout: Duration,
}

impl StoreLock {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            inner: RwLock::new(()),
            timeout,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquire the shared side.
    ///
    /// # Errors
    /// Returns [`Error::LockTimeout`] if a writer holds the lock past the timeout.
    pub fn read(&self) -> Result<ReadGuard<'_>> {
        self.inner.try_read_for(self.timeout).ok_or_else(|| {
            warn!(timeout_ms = self.timeout.as_millis() as u64, "Read lock timed out");
            Error::LockTimeout(self.timeout)
        })
    }

    /// Acquire the exclusive side.
    ///
    /// # Errors
    /// Returns [`Error::LockTimeout`] if the lock stays held past the timeout.
    pub fn write(&self) -> Result<WriteGuard<'_>> {
        self.inner.try_write_for(self.timeout).ok_or_else(|| {
            warn!(timeout_ms = self.timeout.as_millis() as u64, "Write lock timed out");
            Error::LockTimeout(self.timeout)
        })
    }
}

impl Default for StoreLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_share() {
        let lock = StoreLock::default();
        let a = lock.read().unwrap();
        let b = lock.read().unwrap();
        drop((a, b));
    }

    #[test]
    fn writer_blocks_other_writers_until_timeout() {
        let lock = StoreLock::new(Duration::from_millis(20));
        let _held = lock.write().unwrap();

        let err = lock.write().unwrap_err();
        assert!(matches!(err, Error::LockTimeout(d) if d == Duration::from_millis(20)));
    }

    #[test]
    fn writer_blocks_readers_until_timeout() {
        let lock = StoreLock::new(Duration::from_millis(20));
        let _held = lock.write().unwrap();

        assert!(lock.read().is_err());
    }

    #[test]
    fn guard_release_on_drop() {
        let lock = StoreLock::new(Duration::from_millis(20));
        {
            let _held = lock.write().unwrap();
        }
        assert!(lock.write().is_ok());
    }
}
