// SPDX-License-Identifier: MIT OR Apache-2.0
//! A parking mutual exclusion primitive that works across native and WebAssembly targets.
//!
//! [`ReentrantRwLock`](crate::ReentrantRwLock) uses three of these: one around the
//! active reader count, one around the writer count, and one as the admission
//! serialization token that keeps at most one reader contending for the read-admission
//! permit at a time.

use crate::NotAvailable;
use crate::guard::Guard;
use crate::wait_list::WaitList;
use std::cell::UnsafeCell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

/// A mutual exclusion primitive that works across native and WebAssembly targets.
///
/// This mutex provides several locking strategies:
/// - **`try_lock`**: Non-blocking attempt to acquire the lock
/// - **`lock_spin`**: Spin-wait until the lock is acquired
/// - **`lock_block`**: Unconditionally parks the thread (will panic without `Atomics.wait`)
/// - **`lock_sync`**: Parks where the platform allows it and spins otherwise
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::Mutex;
///
/// let readers = Mutex::new(0usize);
///
/// {
///     let mut guard = readers.lock_sync();
///     *guard += 1;
/// }
///
/// assert_eq!(readers.with_sync(|n| *n), 1);
/// ```
#[derive(Debug)]
pub struct Mutex<T> {
    inner: UnsafeCell<T>,
    locked: AtomicBool,
    waiters: WaitList,
}

impl<T> Mutex<T> {
    /// Creates a new unlocked mutex holding `value`.
    pub const fn new(value: T) -> Self {
        Mutex {
            inner: UnsafeCell::new(value),
            locked: AtomicBool::new(false),
            waiters: WaitList::new(),
        }
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// # Examples
    ///
    /// ```
    /// use reentrant_rwlock::{Mutex, NotAvailable};
    ///
    /// let mutex = Mutex::new(0);
    /// let _held = mutex.lock_sync();
    /// assert!(matches!(mutex.try_lock(), Err(NotAvailable)));
    /// ```
    pub fn try_lock(&self) -> Result<Guard<'_, T>, NotAvailable> {
        if self
            .locked
            .compare_exchange(false, true, Acquire, Relaxed)
            .is_ok()
        {
            // SAFETY: the flag we just set excludes every other guard.
            let data = unsafe { &mut *self.inner.get() };
            Ok(Guard { mutex: self, data })
        } else {
            Err(NotAvailable)
        }
    }

    /// Acquires the lock by spinning until it becomes available.
    pub fn lock_spin(&self) -> Guard<'_, T> {
        self.waiters.spin_until(|| self.try_lock().ok())
    }

    /// Acquires the lock by parking the current thread until it becomes available.
    ///
    /// On wasm32 this panics on threads that cannot use `Atomics.wait`, such as a
    /// browser's main thread. Use [`lock_sync`](Self::lock_sync) there.
    pub fn lock_block(&self) -> Guard<'_, T> {
        self.waiters.block_until(|| self.try_lock().ok())
    }

    /// Acquires the lock with the best strategy for the current platform.
    ///
    /// # Examples
    ///
    /// ```
    /// # // std::thread::spawn panics on wasm32
    /// # if cfg!(target_arch = "wasm32") { return; }
    /// use reentrant_rwlock::Mutex;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let counter = Arc::new(Mutex::new(0));
    /// let handles: Vec<_> = (0..4)
    ///     .map(|_| {
    ///         let counter = Arc::clone(&counter);
    ///         thread::spawn(move || *counter.lock_sync() += 1)
    ///     })
    ///     .collect();
    /// for handle in handles {
    ///     handle.join().unwrap();
    /// }
    /// assert_eq!(*counter.lock_sync(), 4);
    /// ```
    pub fn lock_sync(&self) -> Guard<'_, T> {
        self.waiters.sync_until(|| self.try_lock().ok())
    }

    /// Runs `f` with shared access to the data inside a short critical section.
    pub fn with_sync<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
        let guard = self.lock_sync();
        f(&guard)
    }

    /// Runs `f` with exclusive access to the data inside a short critical section.
    pub fn with_mut_sync<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
        let mut guard = self.lock_sync();
        f(&mut guard)
    }

    pub(crate) fn unlock(&self) {
        self.locked.store(false, Release);
        self.waiters.wake_all();
    }
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Mutex::new(T::default())
    }
}

impl<T> From<T> for Mutex<T> {
    fn from(value: T) -> Self {
        Mutex::new(value)
    }
}
