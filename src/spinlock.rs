// SPDX-License-Identifier: MIT OR Apache-2.0
//! A closure-scoped spinlock for very short critical sections.
//!
//! The reader-writer lock keeps its reentrancy state (owner thread, nested write count,
//! nested read count) behind a [`Spinlock`]. Every access to that state is a handful of
//! integer updates, so parking a thread would cost more than spinning. The spinlock also
//! backs the wait lists of [`Mutex`](crate::Mutex) and [`Permit`](crate::Permit).
//!
//! Prefer [`Mutex`](crate::Mutex) for anything that may be held for longer than a few
//! instructions.

use std::cell::UnsafeCell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

/// A spinlock for protecting short-lived critical sections.
///
/// The only way to reach the data is [`with_mut`](Self::with_mut), so every access is
/// bounded by a closure and the lock cannot be leaked.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::spinlock::Spinlock;
///
/// let spinlock = Spinlock::new((0u16, 0u16));
///
/// let depth = spinlock.with_mut(|(writes, reads)| {
///     *writes += 1;
///     *reads += 2;
///     *writes + *reads
/// });
///
/// assert_eq!(depth, 3);
/// ```
#[derive(Debug)]
pub struct Spinlock<T> {
    data: UnsafeCell<T>,
    locked: AtomicBool,
}

impl<T> Spinlock<T> {
    /// Creates a new spinlock with the given initial value.
    pub const fn new(data: T) -> Self {
        Spinlock {
            data: UnsafeCell::new(data),
            locked: AtomicBool::new(false),
        }
    }

    /// Executes a closure with exclusive access to the protected data.
    ///
    /// The lock is released when the closure returns or unwinds.
    ///
    /// # Examples
    ///
    /// ```
    /// # // std::thread::spawn panics on wasm32
    /// # if cfg!(target_arch = "wasm32") { return; }
    /// use reentrant_rwlock::spinlock::Spinlock;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let shared = Arc::new(Spinlock::new(0));
    /// let handles: Vec<_> = (0..4)
    ///     .map(|_| {
    ///         let shared = Arc::clone(&shared);
    ///         thread::spawn(move || {
    ///             for _ in 0..25 {
    ///                 shared.with_mut(|n| *n += 1);
    ///             }
    ///         })
    ///     })
    ///     .collect();
    ///
    /// for handle in handles {
    ///     handle.join().unwrap();
    /// }
    /// assert_eq!(shared.with_mut(|n| *n), 100);
    /// ```
    pub fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        while self
            .locked
            .compare_exchange_weak(false, true, Acquire, Relaxed)
            .is_err()
        {
            // Wait on a plain load so contended threads don't bounce the cache line.
            while self.locked.load(Relaxed) {
                std::hint::spin_loop();
            }
        }
        let _unlock = Unlock(&self.locked);
        // SAFETY: `locked` is ours until `_unlock` drops, so no other reference exists.
        f(unsafe { &mut *self.data.get() })
    }
}

struct Unlock<'a>(&'a AtomicBool);

impl Drop for Unlock<'_> {
    fn drop(&mut self) {
        self.0.store(false, Release);
    }
}

unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T: Default> Default for Spinlock<T> {
    fn default() -> Self {
        Spinlock::new(T::default())
    }
}

impl<T> From<T> for Spinlock<T> {
    fn from(value: T) -> Self {
        Spinlock::new(value)
    }
}
