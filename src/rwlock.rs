// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reentrant, writer-preferring reader-writer lock.
//!
//! # The Problem
//!
//! A plain reader-writer lock lets a steady stream of readers starve a writer forever: as
//! long as one reader is inside, the next one is admitted. It also deadlocks a thread that
//! already holds the lock and asks for it again, which is exactly what happens when a
//! locked method calls another locked method on the same object.
//!
//! # The Solution
//!
//! [`ReentrantRwLock`] solves the second readers-writers problem. Once a writer announces
//! itself, no new reader is admitted; readers already inside finish normally, then the
//! writer runs. On top of that the lock is reentrant:
//!
//! - **write → write**: the exclusive owner may take the write lock again
//! - **write → read**: the exclusive owner may read without giving up its write hold
//! - **read → read**: a reader may nest reads, even while a writer is waiting
//!
//! Two nestings are rejected with a [`LockError`](crate::LockError) instead of
//! deadlocking:
//!
//! - **write → read → write** ([`LockError::WriteUnderRead`](crate::LockError::WriteUnderRead))
//! - **read → write** ([`LockError::UpgradeNotSupported`](crate::LockError::UpgradeNotSupported))
//!
//! Nested holds on one thread must be released in reverse order of acquisition.
//!
//! # How it works
//!
//! The lock owns no data. Its state is split into independent protection domains, none of
//! which serializes every operation:
//!
//! - the **resource permit**, held by the group of active readers or by one writer;
//! - the **admission permit**, which a new reader must pass through and which the first
//!   waiting writer seizes to shut readers out;
//! - an **admission token** so that at most one reader at a time contends with writers for
//!   the admission permit;
//! - the **reader count** and the **writer count**, each behind its own [`Mutex`](crate::Mutex);
//! - the **owner state** (owner thread, nested writes, nested reads) behind a
//!   [`Spinlock`](crate::spinlock::Spinlock).
//!
//! Writer preference is best-effort: the admission token biases the race for the admission
//! permit toward a waiting writer but does not impose FIFO order.
//!
//! # Examples
//!
//! ## Scoped acquisition
//!
//! ```
//! use reentrant_rwlock::ReentrantRwLock;
//!
//! let lock = ReentrantRwLock::new();
//!
//! {
//!     let _writing = lock.write().unwrap();
//!     // A locked helper may take the lock again.
//!     let _reading = lock.read().unwrap();
//! }
//!
//! let status = lock.status();
//! assert_eq!(status.owner, None);
//! assert!(status.resource_available);
//! ```
//!
//! ## Raw acquire and release
//!
//! ```
//! use reentrant_rwlock::{LockError, ReentrantRwLock};
//!
//! let lock = ReentrantRwLock::new();
//!
//! lock.acquire_read().unwrap();
//! assert_eq!(lock.acquire_write(), Err(LockError::UpgradeNotSupported));
//! lock.release_read();
//!
//! lock.acquire_write().unwrap();
//! lock.release_write();
//! ```
//!
//! ## Many readers, one writer
//!
//! ```
//! # // std::thread::spawn panics on wasm32
//! # if cfg!(target_arch = "wasm32") { return; }
//! use reentrant_rwlock::ReentrantRwLock;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::thread;
//!
//! let lock = Arc::new(ReentrantRwLock::new());
//! let value = Arc::new(AtomicUsize::new(0));
//!
//! let writer = {
//!     let (lock, value) = (Arc::clone(&lock), Arc::clone(&value));
//!     thread::spawn(move || lock.with_write(|| value.store(7, Ordering::Relaxed)).unwrap())
//! };
//! writer.join().unwrap();
//!
//! let readers: Vec<_> = (0..3)
//!     .map(|_| {
//!         let (lock, value) = (Arc::clone(&lock), Arc::clone(&value));
//!         thread::spawn(move || lock.with_read(|| value.load(Ordering::Relaxed)).unwrap())
//!     })
//!     .collect();
//! for reader in readers {
//!     assert_eq!(reader.join().unwrap(), 7);
//! }
//! ```

mod depth;
mod inner;
mod read;
mod write;


pub use inner::{LockStatus, ReentrantRwLock};
