use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Shared/exclusive lock guarding one image store.
///
/// Readers hold the shared side only for the duration of a single read, so
/// writers and garbage collection can interleave between reads. Guards
/// release the lock when dropped.
#[derive(Debug, Default)]
pub struct StoreLock {
    inner: RwLock<()>,
}

impl StoreLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the shared (read) side.
    pub fn read(&self) -> StoreResult<RwLockReadGuard<'_, ()>> {
        let started = Instant::now();
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        debug!(wait_us = started.elapsed().as_micros() as u64, "acquired shared store lock");
        Ok(guard)
    }

    /// Acquire the exclusive (write) side.
    pub fn write(&self) -> StoreResult<RwLockWriteGuard<'_, ()>> {
        let started = Instant::now();
        let guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        debug!(wait_us = started.elapsed().as_micros() as u64, "acquired exclusive store lock");
        Ok(guard)
    }

    /// Returns `true` if nobody currently holds either side.
    pub fn is_free(&self) -> bool {
        self.inner.try_write().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_scopes_are_shared() {
        let lock = StoreLock::new();
        let a = lock.read().unwrap();
        let b = lock.read().unwrap();
        assert!(!lock.is_free());
        drop(a);
        drop(b);
        assert!(lock.is_free());
    }

    #[test]
    fn write_excludes_readers() {
        use std::sync::Arc;
        use std::thread;

        let lock = Arc::new(StoreLock::new());
        let guard = lock.write().unwrap();
        let other = Arc::clone(&lock);
        let reader = thread::spawn(move || other.read().map(|_| ()).is_ok());
        drop(guard);
        assert!(reader.join().expect("reader should not panic"));
        assert!(lock.is_free());
    }

    #[test]
    fn poisoned_lock_is_reported() {
        use std::sync::Arc;
        use std::thread;

        let lock = Arc::new(StoreLock::new());
        let poisoner = Arc::clone(&lock);
        let _ = thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(matches!(lock.read(), Err(StoreError::LockPoisoned)));
    }
}
