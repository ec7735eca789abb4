// SPDX-License-Identifier: MIT OR Apache-2.0
use super::depth;
use super::inner::ReentrantRwLock;
use crate::error::{LockError, MAX_NESTING, Nesting};
use crate::guard::ReadGuard;
use std::marker::PhantomData;
use std::thread;

impl ReentrantRwLock {
    /// Acquires a read position, blocking while a writer holds or is waiting for the lock.
    ///
    /// Returns without blocking when the calling thread already holds the write lock or a
    /// read lock on this lock. Every successful call must be paired with one
    /// [`release_read`](Self::release_read) on the same thread.
    ///
    /// # Errors
    ///
    /// [`LockError::Overflow`] if the thread already nests 65,535 reads on this lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use reentrant_rwlock::ReentrantRwLock;
    ///
    /// let lock = ReentrantRwLock::new();
    /// lock.acquire_read().unwrap();
    /// lock.acquire_read().unwrap();
    /// assert_eq!(lock.status().readers, 1);
    /// lock.release_read();
    /// lock.release_read();
    /// assert_eq!(lock.status().readers, 0);
    /// ```
    pub fn acquire_read(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let as_owner = self.state.with_mut(|state| {
            if state.owner != Some(me) {
                return None;
            }
            if state.self_reads == MAX_NESTING {
                return Some(Err(LockError::Overflow(Nesting::Read)));
            }
            state.self_reads += 1;
            Some(Ok(()))
        });
        if let Some(result) = as_owner {
            return result;
        }
        if let Some(result) = depth::nest(self.id) {
            return result;
        }

        self.admit_reader();
        depth::enter(self.id);
        Ok(())
    }

    fn admit_reader(&self) {
        // One reader at a time contends for admission, so a writer arriving now has
        // at most one competitor.
        let _token = self.admission_token.lock_sync();
        self.admission.acquire_sync();
        {
            let mut readers = self.readers.lock_sync();
            *readers += 1;
            if *readers == 1 {
                log::trace!("lock {}: first reader taking the resource", self.id);
                self.resource.acquire_sync();
            }
        }
        self.admission.release();
    }

    /// Releases one read position taken by [`acquire_read`](Self::acquire_read).
    ///
    /// When the last reader leaves, the resource is handed back so a waiting writer can
    /// proceed. Must be called on the thread that acquired the read, in reverse order of
    /// that thread's other acquisitions on this lock.
    pub fn release_read(&self) {
        let me = thread::current().id();
        let as_owner = self.state.with_mut(|state| {
            if state.owner != Some(me) {
                return false;
            }
            debug_assert!(state.self_reads > 0, "release_read without a matching acquire_read");
            state.self_reads -= 1;
            true
        });
        if as_owner || depth::unnest(self.id) > 0 {
            return;
        }

        let mut readers = self.readers.lock_sync();
        debug_assert!(*readers > 0, "release_read with no active readers");
        *readers -= 1;
        if *readers == 0 {
            log::trace!("lock {}: last reader returning the resource", self.id);
            self.resource.release();
        }
    }

    /// Acquires a read position released when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// See [`acquire_read`](Self::acquire_read).
    pub fn read(&self) -> Result<ReadGuard<'_>, LockError> {
        self.acquire_read()?;
        Ok(ReadGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// Runs `f` while holding a read position.
    ///
    /// # Errors
    ///
    /// See [`acquire_read`](Self::acquire_read). `f` does not run if acquisition fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use reentrant_rwlock::ReentrantRwLock;
    /// use std::cell::Cell;
    ///
    /// let lock = ReentrantRwLock::new();
    /// let value = Cell::new(3);
    /// assert_eq!(lock.with_read(|| value.get() * 2), Ok(6));
    /// ```
    pub fn with_read<R, F: FnOnce() -> R>(&self, f: F) -> Result<R, LockError> {
        let _guard = self.read()?;
        Ok(f())
    }
}
