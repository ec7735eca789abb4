// SPDX-License-Identifier: MIT OR Apache-2.0
//! A binary permit that one thread can take and any thread can give back.
//!
//! A [`Permit`] behaves like an auto-reset event: [`release`](Permit::release) makes it
//! available, and exactly one acquirer consumes that availability. Unlike a [`Mutex`]
//! there is no guard, because the thread that gives the permit back is often not the
//! one that took it. In [`ReentrantRwLock`](crate::ReentrantRwLock) the first reader
//! takes the resource permit on behalf of every reader and whichever reader leaves last
//! returns it.
//!
//! [`Mutex`]: crate::Mutex

use crate::NotAvailable;
use crate::wait_list::WaitList;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

/// A binary semaphore with try, spin, block, and sync acquisition strategies.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::Permit;
///
/// let permit = Permit::new(true);
/// permit.acquire_sync();
/// assert!(!permit.is_available());
///
/// permit.release();
/// assert!(permit.is_available());
/// ```
///
/// ## Handing a permit to another thread
///
/// ```
/// # // std::thread::spawn panics on wasm32
/// # if cfg!(target_arch = "wasm32") { return; }
/// use reentrant_rwlock::Permit;
/// use std::sync::Arc;
/// use std::thread;
///
/// let permit = Arc::new(Permit::new(false));
/// let waiter = {
///     let permit = Arc::clone(&permit);
///     thread::spawn(move || permit.acquire_block())
/// };
///
/// // Released by a thread that never acquired it.
/// permit.release();
/// waiter.join().unwrap();
/// assert!(!permit.is_available());
/// ```
#[derive(Debug)]
pub struct Permit {
    available: AtomicBool,
    waiters: WaitList,
}

impl Permit {
    /// Creates a permit that starts out available or taken.
    pub const fn new(available: bool) -> Self {
        Permit {
            available: AtomicBool::new(available),
            waiters: WaitList::new(),
        }
    }

    /// Takes the permit if it is available right now.
    pub fn try_acquire(&self) -> Result<(), NotAvailable> {
        self.available
            .compare_exchange(true, false, Acquire, Relaxed)
            .map(|_| ())
            .map_err(|_| NotAvailable)
    }

    /// Takes the permit, spinning until it is released.
    pub fn acquire_spin(&self) {
        self.waiters.spin_until(|| self.try_acquire().ok());
    }

    /// Takes the permit, parking the current thread until it is released.
    ///
    /// On wasm32 this panics on threads that cannot use `Atomics.wait`. Use
    /// [`acquire_sync`](Self::acquire_sync) there.
    pub fn acquire_block(&self) {
        self.waiters.block_until(|| self.try_acquire().ok());
    }

    /// Takes the permit with the best waiting strategy for the current platform.
    pub fn acquire_sync(&self) {
        self.waiters.sync_until(|| self.try_acquire().ok());
    }

    /// Makes the permit available and wakes its waiters.
    ///
    /// Releasing a permit that is already available leaves it available; releases do not
    /// accumulate.
    pub fn release(&self) {
        self.available.store(true, Release);
        self.waiters.wake_all();
    }

    /// Whether the permit could be taken right now. Racy by nature.
    pub fn is_available(&self) -> bool {
        self.available.load(Relaxed)
    }
}

impl Default for Permit {
    /// An available permit.
    fn default() -> Self {
        Permit::new(true)
    }
}
