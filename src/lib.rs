// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reentrant, writer-preferring reader-writer lock that works across native and
//! WebAssembly targets.
//!
//! The centerpiece is [`ReentrantRwLock`]: many readers at once, one writer at a time,
//! writers never starved by a stream of readers, and the same thread may take the lock
//! again without deadlocking itself. See the [`rwlock`] module for the full story.
//!
//! The building blocks it is made of are public too:
//!
//! - [`Mutex`]: a parking mutex over `T`
//! - [`Permit`]: a binary permit that can be returned by a thread other than the one that took it
//! - [`spinlock::Spinlock`]: closure-scoped spinning for tiny critical sections
//!
//! Each of them waits the right way for the platform: by parking on native targets and on
//! WebAssembly workers that can use `Atomics.wait`, and by spinning on WebAssembly threads
//! that cannot block, such as a browser's main thread.
//!
//! [`cache::SynchronizedCache`] shows the lock protecting a keyed store.
//!
//! # Examples
//!
//! ```
//! use reentrant_rwlock::ReentrantRwLock;
//!
//! let lock = ReentrantRwLock::new();
//!
//! lock.acquire_write().unwrap();
//! lock.acquire_write().unwrap();
//! lock.acquire_read().unwrap();
//! lock.release_read();
//! lock.release_write();
//! lock.release_write();
//!
//! assert_eq!(lock.status().owner, None);
//! ```

pub mod cache;
mod error;
pub mod guard;
mod mutex;
pub mod permit;
pub mod rwlock;
pub mod spinlock;
mod wait_list;
mod wasm_support;

#[cfg(test)]
mod sync_tests;

pub use error::{LockError, MAX_NESTING, Nesting, NotAvailable};
pub use guard::{Guard, ReadGuard, WriteGuard};
pub use mutex::Mutex;
pub use permit::Permit;
pub use rwlock::{LockStatus, ReentrantRwLock};
