// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parked-thread bookkeeping shared by [`Mutex`](crate::Mutex) and [`Permit`](crate::Permit).
//!
//! A waiter registers itself under the list's spinlock only after a failed attempt made
//! under that same spinlock. A releaser publishes its release before draining the list, so
//! a waiter either sees the release or is already registered to be woken by it.

use crate::spinlock::Spinlock;
use std::thread;

#[derive(Debug, Default)]
pub(crate) struct WaitList {
    threads: Spinlock<Vec<thread::Thread>>,
}

impl WaitList {
    pub(crate) const fn new() -> Self {
        WaitList {
            threads: Spinlock::new(Vec::new()),
        }
    }

    /// Retries `attempt` in a tight loop until it succeeds.
    pub(crate) fn spin_until<R>(&self, mut attempt: impl FnMut() -> Option<R>) -> R {
        loop {
            if let Some(r) = attempt() {
                return r;
            }
            std::hint::spin_loop();
        }
    }

    /// Parks the current thread between attempts until `attempt` succeeds.
    pub(crate) fn block_until<R>(&self, mut attempt: impl FnMut() -> Option<R>) -> R {
        loop {
            let r = self.threads.with_mut(|threads| {
                let r = attempt();
                if r.is_none() {
                    threads.push(thread::current());
                }
                r
            });
            match r {
                Some(r) => return r,
                None => thread::park(),
            }
        }
    }

    /// Blocks if the platform allows it and spins otherwise.
    pub(crate) fn sync_until<R>(&self, attempt: impl FnMut() -> Option<R>) -> R {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.block_until(attempt)
        }
        #[cfg(target_arch = "wasm32")]
        {
            if crate::wasm_support::atomics_wait_supported() {
                self.block_until(attempt)
            } else {
                self.spin_until(attempt)
            }
        }
    }

    /// Wakes every registered thread. Threads that lose the race register again.
    pub(crate) fn wake_all(&self) {
        let threads = self.threads.with_mut(std::mem::take);
        for thread in threads {
            thread.unpark();
        }
    }
}
