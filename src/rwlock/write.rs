// SPDX-License-Identifier: MIT OR Apache-2.0
use super::depth;
use super::inner::ReentrantRwLock;
use crate::error::{LockError, MAX_NESTING, Nesting};
use crate::guard::WriteGuard;
use std::marker::PhantomData;
use std::thread;

impl ReentrantRwLock {
    /// Acquires the lock exclusively, blocking until every active reader and writer is done.
    ///
    /// As soon as the first writer of a group starts waiting, new readers stop being
    /// admitted. Returns without blocking when the calling thread already owns the write
    /// lock. Every successful call must be paired with one
    /// [`release_write`](Self::release_write) on the same thread.
    ///
    /// # Errors
    ///
    /// - [`LockError::WriteUnderRead`] if the caller owns the write lock and still holds a
    ///   read nested on it.
    /// - [`LockError::UpgradeNotSupported`] if the caller holds a plain read lock.
    /// - [`LockError::Overflow`] if the caller already nests 65,535 writes.
    ///
    /// A failed call leaves the lock exactly as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use reentrant_rwlock::ReentrantRwLock;
    ///
    /// let lock = ReentrantRwLock::new();
    /// lock.acquire_write().unwrap();
    /// lock.acquire_write().unwrap();
    /// assert_eq!(lock.write_depth(), 2);
    /// lock.release_write();
    /// lock.release_write();
    /// assert_eq!(lock.status().owner, None);
    /// ```
    pub fn acquire_write(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let reentered = self.state.with_mut(|state| {
            if state.exclusive == 0 || state.owner != Some(me) {
                return None;
            }
            if state.self_reads != 0 {
                return Some(Err(LockError::WriteUnderRead));
            }
            if state.exclusive == MAX_NESTING {
                return Some(Err(LockError::Overflow(Nesting::Write)));
            }
            state.exclusive += 1;
            Some(Ok(()))
        });
        if let Some(result) = reentered {
            if let Err(err) = result {
                log::debug!("lock {}: rejected write re-entry: {err}", self.id);
            }
            return result;
        }
        if depth::current(self.id) > 0 {
            log::debug!("lock {}: rejected read-to-write upgrade", self.id);
            return Err(LockError::UpgradeNotSupported);
        }

        {
            let mut writers = self.writers.lock_sync();
            *writers += 1;
            if *writers == 1 {
                log::trace!("lock {}: first writer closing reader admission", self.id);
                self.admission.acquire_sync();
            }
        }
        self.resource.acquire_sync();
        self.state.with_mut(|state| {
            state.owner = Some(me);
            state.exclusive = 1;
        });
        Ok(())
    }

    /// Releases one write hold taken by [`acquire_write`](Self::acquire_write).
    ///
    /// Only the outermost release gives the lock up. When the last writer of a group
    /// leaves, readers are admitted again.
    ///
    /// Reads nested on the write hold must be released first. If they are not, the lock
    /// stays exclusively held by this thread.
    pub fn release_write(&self) {
        let unwound = self.state.with_mut(|state| {
            debug_assert!(
                state.exclusive > 0 && state.owner == Some(thread::current().id()),
                "release_write by a thread that does not hold the write lock"
            );
            state.exclusive -= 1;
            if state.exclusive != 0 || state.self_reads != 0 {
                return false;
            }
            state.owner = None;
            true
        });
        if !unwound {
            return;
        }

        self.resource.release();
        let mut writers = self.writers.lock_sync();
        *writers -= 1;
        if *writers == 0 {
            log::trace!("lock {}: last writer reopening reader admission", self.id);
            self.admission.release();
        }
    }

    /// Acquires the write lock, released when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// See [`acquire_write`](Self::acquire_write).
    pub fn write(&self) -> Result<WriteGuard<'_>, LockError> {
        self.acquire_write()?;
        Ok(WriteGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// Runs `f` while holding the write lock.
    ///
    /// # Errors
    ///
    /// See [`acquire_write`](Self::acquire_write). `f` does not run if acquisition fails.
    pub fn with_write<R, F: FnOnce() -> R>(&self, f: F) -> Result<R, LockError> {
        let _guard = self.write()?;
        Ok(f())
    }
}
