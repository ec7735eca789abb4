// SPDX-License-Identifier: MIT OR Apache-2.0
use super::depth;
use crate::Mutex;
use crate::Permit;
use crate::spinlock::Spinlock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;
use std::thread::{self, ThreadId};

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(0);

/// Reentrancy bookkeeping for the thread that holds the write lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OwnerState {
    pub(crate) owner: Option<ThreadId>,
    /// Write acquisitions by `owner`, outermost included.
    pub(crate) exclusive: u16,
    /// Reads `owner` has nested on top of its write hold.
    pub(crate) self_reads: u16,
}

/// A reentrant, writer-preferring reader-writer lock.
///
/// Many threads may hold the lock for reading at once; one thread at a time may hold it
/// for writing. Once a writer is waiting, new readers queue behind it, so writers are never
/// starved by a stream of readers.
///
/// The lock protects no data of its own: wrap reads of your resource in
/// [`read`](Self::read) / [`with_read`](Self::with_read) and mutations in
/// [`write`](Self::write) / [`with_write`](Self::with_write). The raw
/// [`acquire_read`](Self::acquire_read) / [`release_read`](Self::release_read) and
/// [`acquire_write`](Self::acquire_write) / [`release_write`](Self::release_write) pairs are
/// available for callers that manage release themselves.
///
/// ## Reentrancy
///
/// | Already holding | Then asking for | Result |
/// |---|---|---|
/// | write | write | granted without blocking |
/// | write | read | granted without blocking |
/// | read | read | granted without blocking |
/// | write, then read | write | [`LockError::WriteUnderRead`](crate::LockError::WriteUnderRead) |
/// | read | write | [`LockError::UpgradeNotSupported`](crate::LockError::UpgradeNotSupported) |
///
/// Each kind nests at most 65,535 times per thread; one more returns
/// [`LockError::Overflow`](crate::LockError::Overflow).
///
/// ## Misuse
///
/// Releasing a hold that was never acquired, releasing on another thread, or releasing
/// out of stack order is not detected in release builds and can leave the lock held
/// forever. Debug builds assert on the cases that would underflow a counter.
///
/// # Examples
///
/// ```
/// use reentrant_rwlock::ReentrantRwLock;
///
/// let lock = ReentrantRwLock::new();
///
/// let total = lock
///     .with_write(|| {
///         // Helpers that lock for reading work while we hold the write lock.
///         lock.with_read(|| 40).unwrap() + 2
///     })
///     .unwrap();
/// assert_eq!(total, 42);
/// ```
#[derive(Debug)]
pub struct ReentrantRwLock {
    pub(crate) id: u64,
    pub(crate) readers: Mutex<usize>,
    pub(crate) writers: Mutex<usize>,
    pub(crate) resource: Permit,
    pub(crate) admission: Permit,
    pub(crate) admission_token: Mutex<()>,
    pub(crate) state: Spinlock<OwnerState>,
}

/// A point-in-time view of a [`ReentrantRwLock`], returned by [`ReentrantRwLock::status`].
///
/// The fields are read one protection domain at a time, so under contention the snapshot
/// may mix moments. It is meant for diagnostics and tests, not for making locking decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    /// Threads inside the read critical section through admission.
    pub readers: usize,
    /// Writers that announced themselves and have not finished yet.
    pub writers: usize,
    /// The thread holding the write lock.
    pub owner: Option<ThreadId>,
    /// Nested write acquisitions by `owner`.
    pub exclusive: u16,
    /// Reads `owner` nested on top of its write hold.
    pub self_reads: u16,
    /// Whether no reader group and no writer occupies the resource.
    pub resource_available: bool,
    /// Whether new readers may pass admission.
    pub admission_available: bool,
}

impl ReentrantRwLock {
    /// Creates an unlocked lock.
    pub fn new() -> ReentrantRwLock {
        ReentrantRwLock {
            id: NEXT_LOCK_ID.fetch_add(1, Relaxed),
            readers: Mutex::new(0),
            writers: Mutex::new(0),
            resource: Permit::new(true),
            admission: Permit::new(true),
            admission_token: Mutex::new(()),
            state: Spinlock::new(OwnerState::default()),
        }
    }

    /// Returns a snapshot of the lock's counters, owner, and permits.
    ///
    /// Briefly waits on the reader and writer counters, so it may block while another
    /// thread is admitting the first reader or the first writer.
    ///
    /// # Examples
    ///
    /// ```
    /// use reentrant_rwlock::ReentrantRwLock;
    ///
    /// let lock = ReentrantRwLock::new();
    /// let _reading = lock.read().unwrap();
    ///
    /// let status = lock.status();
    /// assert_eq!(status.readers, 1);
    /// assert!(!status.resource_available);
    /// assert!(status.admission_available);
    /// ```
    pub fn status(&self) -> LockStatus {
        let state = self.state.with_mut(|state| *state);
        LockStatus {
            readers: self.readers.with_sync(|n| *n),
            writers: self.writers.with_sync(|n| *n),
            owner: state.owner,
            exclusive: state.exclusive,
            self_reads: state.self_reads,
            resource_available: self.resource.is_available(),
            admission_available: self.admission.is_available(),
        }
    }

    /// Whether the calling thread holds the write lock.
    pub fn is_write_held_by_current_thread(&self) -> bool {
        self.write_depth() > 0
    }

    /// How many times the calling thread has nested the write lock. Zero if it does not own it.
    pub fn write_depth(&self) -> u16 {
        let me = thread::current().id();
        self.state
            .with_mut(|state| if state.owner == Some(me) { state.exclusive } else { 0 })
    }

    /// How many read holds the calling thread has on this lock, whether nested on its own
    /// write hold or taken as a plain reader.
    pub fn read_depth(&self) -> u16 {
        let me = thread::current().id();
        let self_reads = self.state.with_mut(|state| {
            if state.owner == Some(me) {
                Some(state.self_reads)
            } else {
                None
            }
        });
        self_reads.unwrap_or_else(|| depth::current(self.id))
    }
}

impl Default for ReentrantRwLock {
    fn default() -> Self {
        ReentrantRwLock::new()
    }
}
