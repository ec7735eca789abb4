// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types returned by the lock and its building blocks.

use thiserror::Error;

/// The largest number of nested acquisitions of one kind a thread may hold on a single lock.
pub const MAX_NESTING: u16 = u16::MAX;

/// The kind of nested acquisition that hit [`MAX_NESTING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    /// Read acquisitions, either on top of the thread's own write hold or on top of a plain read.
    Read,
    /// Write acquisitions by the current exclusive owner.
    Write,
}

impl std::fmt::Display for Nesting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nesting::Read => f.write_str("read"),
            Nesting::Write => f.write_str("write"),
        }
    }
}

/// Error returned when an acquisition on a [`ReentrantRwLock`](crate::ReentrantRwLock) is rejected.
///
/// A rejected call never changes the state of the lock: the caller still holds exactly
/// what it held before the call.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::{LockError, ReentrantRwLock};
///
/// let lock = ReentrantRwLock::new();
/// lock.acquire_write().unwrap();
/// lock.acquire_read().unwrap();
///
/// // A write cannot be pushed underneath a read nested on our own write hold.
/// assert_eq!(lock.acquire_write(), Err(LockError::WriteUnderRead));
///
/// lock.release_read();
/// lock.release_write();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LockError {
    /// The exclusive owner tried to re-enter the write lock while a read nested on its
    /// own write hold is still active.
    #[error("write lock re-entered while a nested read lock is still held")]
    WriteUnderRead,
    /// A thread holding only a read lock tried to acquire the write lock.
    ///
    /// Upgrading is not supported. Release the read lock first.
    #[error("write lock requested by a thread that holds a read lock")]
    UpgradeNotSupported,
    /// Another nested acquisition would exceed [`MAX_NESTING`].
    #[error("too many nested {0} acquisitions on one thread (limit is 65535)")]
    Overflow(Nesting),
}

/// Error returned when a lock or permit cannot be immediately acquired.
///
/// This is returned by the `try_` methods of [`Mutex`](crate::Mutex) and
/// [`Permit`](crate::Permit).
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::{NotAvailable, Permit};
///
/// let permit = Permit::new(true);
/// permit.try_acquire().unwrap();
///
/// match permit.try_acquire() {
///     Ok(()) => panic!("Should not succeed"),
///     Err(NotAvailable) => println!("Permit is held elsewhere"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotAvailable;

impl std::fmt::Display for NotAvailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lock not available")
    }
}

impl std::error::Error for NotAvailable {}
