// SPDX-License-Identifier: MIT OR Apache-2.0
//! Guard types for scoped acquisition.
//!
//! [`Guard`] wraps access to [`Mutex`]-protected data. [`ReadGuard`] and [`WriteGuard`]
//! hold a read or write position on a [`ReentrantRwLock`] and give it back on drop, so a
//! hold is released on every exit path, including early returns and panics.

use crate::Mutex;
use crate::ReentrantRwLock;
use std::marker::PhantomData;

/// A guard that provides access to the data protected by a [`Mutex`].
///
/// The lock is released when the guard is dropped.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::Mutex;
///
/// let mutex = Mutex::new(String::from("hello"));
///
/// let mut guard = mutex.lock_sync();
/// guard.push_str(", world!");
/// assert_eq!(&*guard, "hello, world!");
/// drop(guard);
/// ```
pub struct Guard<'a, T> {
    pub(crate) mutex: &'a Mutex<T>,
    pub(crate) data: &'a mut T,
}

impl<T> std::ops::Deref for Guard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T> std::ops::DerefMut for Guard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<T> Drop for Guard<'_, T> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Guard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("data", &**self)
            .finish_non_exhaustive()
    }
}

// ================================================================================================
// ReentrantRwLock Guards
// ================================================================================================

/// A read position on a [`ReentrantRwLock`], released when dropped.
///
/// Created by [`ReentrantRwLock::read`]. The guard is `!Send`: the lock tracks holds per
/// thread, so a read must be released on the thread that acquired it. When a thread holds
/// several guards on the same lock they must be dropped in reverse order of creation.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::ReentrantRwLock;
///
/// let lock = ReentrantRwLock::new();
/// {
///     let _outer = lock.read().unwrap();
///     let _inner = lock.read().unwrap();
///     assert_eq!(lock.read_depth(), 2);
/// }
/// assert_eq!(lock.read_depth(), 0);
/// ```
#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    pub(crate) lock: &'a ReentrantRwLock,
    pub(crate) _not_send: PhantomData<*const ()>,
}

/// An exclusive write position on a [`ReentrantRwLock`], released when dropped.
///
/// Created by [`ReentrantRwLock::write`]. Like [`ReadGuard`] it is `!Send` and nested
/// guards must be dropped in reverse order.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::ReentrantRwLock;
///
/// let lock = ReentrantRwLock::new();
/// {
///     let _outer = lock.write().unwrap();
///     let _inner = lock.write().unwrap();
///     assert_eq!(lock.write_depth(), 2);
/// }
/// assert!(!lock.is_write_held_by_current_thread());
/// ```
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    pub(crate) lock: &'a ReentrantRwLock,
    pub(crate) _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

impl std::fmt::Debug for ReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard").finish_non_exhaustive()
    }
}
