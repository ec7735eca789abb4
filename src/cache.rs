// SPDX-License-Identifier: MIT OR Apache-2.0
//! A keyed store shared between threads and guarded by a [`ReentrantRwLock`].
//!
//! [`SynchronizedCache`] owns its map; the lock owns nothing. Every lookup runs inside a
//! read hold and every mutation inside a write hold. Because the lock is reentrant, a
//! caller can take [`SynchronizedCache::lock`] for writing and perform several mutations
//! that other threads observe all at once, or take it for reading and get a consistent
//! view across several lookups.
//!
//! Lock reentrancy does not extend to the map itself. While a mutation is running, the
//! map's own calls into `K: Hash + Eq` or `V: PartialEq` may call back into the same
//! cache on the same thread. Those calls fail with [`CacheError::Reentrant`] instead of
//! reading a map that is being changed.
//!
//! # Examples
//!
//! ```
//! use reentrant_rwlock::cache::{AddOrUpdateStatus, SynchronizedCache};
//!
//! let cache = SynchronizedCache::new();
//! cache.add(1, "broccoli").unwrap();
//! assert_eq!(cache.add_or_update(1, "cauliflower").unwrap(), AddOrUpdateStatus::Updated);
//! assert_eq!(cache.read(&1).unwrap(), Some("cauliflower"));
//!
//! // Several adds, seen by readers together.
//! {
//!     let _batch = cache.lock().write().unwrap();
//!     cache.add(2, "carrot").unwrap();
//!     cache.add(3, "sorrel").unwrap();
//! }
//! assert_eq!(cache.len().unwrap(), 3);
//! ```

use crate::{LockError, ReentrantRwLock};
use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Error returned by [`SynchronizedCache`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// [`SynchronizedCache::add`] was called with a key that is already present.
    #[error("key already present in cache")]
    DuplicateKey,
    /// The cache lock rejected the acquisition.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// The cache was called again from inside one of its own mutations, for example from
    /// the key's `Hash`/`Eq` or the value's `PartialEq`.
    #[error("cache accessed while one of its mutations is in progress")]
    Reentrant,
}

/// Outcome of [`SynchronizedCache::add_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOrUpdateStatus {
    /// The key was absent and has been inserted.
    Added,
    /// The key was present with a different value, which has been replaced.
    Updated,
    /// The key was already present with an equal value.
    Unchanged,
}

/// A `HashMap` shared between threads behind a [`ReentrantRwLock`].
///
/// Values are cloned out, so no reference into the map outlives the hold it was read under.
/// Every method fails with [`CacheError::Reentrant`] when called from inside a mutation of
/// the same cache.
#[derive(Debug)]
pub struct SynchronizedCache<K, V> {
    lock: ReentrantRwLock,
    inner: UnsafeCell<HashMap<K, V>>,
    /// Set while a `&mut` to `inner` is live.
    mutating: AtomicBool,
}

/// Clears the mutation flag when the `&mut` borrow ends, including on unwind.
struct Mutating<'a>(&'a AtomicBool);

impl Drop for Mutating<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// SAFETY: the map is only touched under the cache lock, read-only under a read hold and
// mutably under a write hold. `mutating` rejects same-thread reentry while a `&mut` is
// live, and no reference into the map escapes a method.
unsafe impl<K: Send, V: Send> Send for SynchronizedCache<K, V> {}
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for SynchronizedCache<K, V> {}

impl<K: Eq + Hash, V> SynchronizedCache<K, V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        SynchronizedCache {
            lock: ReentrantRwLock::new(),
            inner: UnsafeCell::new(HashMap::new()),
            mutating: AtomicBool::new(false),
        }
    }

    /// The lock guarding this cache.
    ///
    /// Hold it for writing to make several mutations appear at once, or for reading to
    /// observe several lookups from one consistent state.
    pub fn lock(&self) -> &ReentrantRwLock {
        &self.lock
    }

    fn with_map<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> Result<R, CacheError> {
        let _guard = self.lock.read()?;
        // Only the write owner can get here during a mutation, through a nested read.
        if self.mutating.load(Ordering::Acquire) {
            return Err(CacheError::Reentrant);
        }
        // SAFETY: other threads' writers are excluded while we hold a read position, and
        // this thread holds no `&mut` to the map.
        Ok(f(unsafe { &*self.inner.get() }))
    }

    fn with_map_mut<R>(
        &self,
        f: impl FnOnce(&mut HashMap<K, V>) -> R,
    ) -> Result<R, CacheError> {
        let _guard = self.lock.write()?;
        if self.mutating.swap(true, Ordering::Acquire) {
            return Err(CacheError::Reentrant);
        }
        let _mutating = Mutating(&self.mutating);
        // SAFETY: the write hold excludes other threads. A write hold taken under a read of
        // this thread is rejected by the lock, and `mutating` rejects nesting inside
        // another mutation, so this is the only live borrow of the map.
        Ok(f(unsafe { &mut *self.inner.get() }))
    }

    /// Number of entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::Lock`] if the read hold is rejected.
    pub fn len(&self) -> Result<usize, CacheError> {
        self.with_map(HashMap::len)
    }

    /// Whether the cache holds no entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::Lock`] if the read hold is rejected.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.with_map(HashMap::is_empty)
    }

    /// Looks `key` up and returns a copy of its value.
    ///
    /// # Errors
    ///
    /// [`CacheError::Lock`] if the read hold is rejected.
    pub fn read(&self, key: &K) -> Result<Option<V>, CacheError>
    where
        V: Clone,
    {
        self.with_map(|map| map.get(key).cloned())
    }

    /// Inserts a new entry.
    ///
    /// # Errors
    ///
    /// [`CacheError::DuplicateKey`] if `key` is already present, in which case the cache is
    /// unchanged. [`CacheError::Lock`] if the write hold is rejected, for example because
    /// the calling thread holds a read on the cache.
    pub fn add(&self, key: K, value: V) -> Result<(), CacheError> {
        self.with_map_mut(|map| {
            if map.contains_key(&key) {
                return Err(CacheError::DuplicateKey);
            }
            map.insert(key, value);
            Ok(())
        })?
    }

    /// Inserts `value` under `key`, or replaces the value already there if it differs.
    ///
    /// # Errors
    ///
    /// [`CacheError::Lock`] if the write hold is rejected.
    pub fn add_or_update(&self, key: K, value: V) -> Result<AddOrUpdateStatus, CacheError>
    where
        V: PartialEq,
    {
        self.with_map_mut(|map| match map.get_mut(&key) {
            Some(existing) if *existing == value => AddOrUpdateStatus::Unchanged,
            Some(existing) => {
                *existing = value;
                AddOrUpdateStatus::Updated
            }
            None => {
                map.insert(key, value);
                AddOrUpdateStatus::Added
            }
        })
    }

    /// Removes `key` and returns its value, if it was present.
    ///
    /// # Errors
    ///
    /// [`CacheError::Lock`] if the write hold is rejected.
    pub fn delete(&self, key: &K) -> Result<Option<V>, CacheError> {
        self.with_map_mut(|map| map.remove(key))
    }
}

impl<K: Eq + Hash, V> Default for SynchronizedCache<K, V> {
    fn default() -> Self {
        SynchronizedCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// A value whose comparison reads and writes the cache it lives in.
    #[derive(Debug, Clone)]
    struct Meddling(u32);

    thread_local! {
        static MEDDLED: SynchronizedCache<u32, Meddling> = SynchronizedCache::new();
        static SEEN_LEN: Cell<Option<Result<usize, CacheError>>> = const { Cell::new(None) };
        static SEEN_DELETE: Cell<Option<Result<bool, CacheError>>> = const { Cell::new(None) };
    }

    impl PartialEq for Meddling {
        fn eq(&self, other: &Self) -> bool {
            MEDDLED.with(|cache| {
                SEEN_LEN.with(|seen| seen.set(Some(cache.len())));
                let deleted = cache.delete(&1).map(|v| v.is_some());
                SEEN_DELETE.with(|seen| seen.set(Some(deleted)));
            });
            self.0 == other.0
        }
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_add_rejects_duplicate() {
        let cache = SynchronizedCache::new();
        cache.add(1, "beet").unwrap();
        assert_eq!(cache.add(1, "cabbage"), Err(CacheError::DuplicateKey));
        assert_eq!(cache.read(&1).unwrap(), Some("beet"));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_add_or_update() {
        let cache = SynchronizedCache::new();
        assert_eq!(cache.add_or_update(15, "cucumber"), Ok(AddOrUpdateStatus::Added));
        assert_eq!(cache.add_or_update(15, "cucumber"), Ok(AddOrUpdateStatus::Unchanged));
        assert_eq!(cache.add_or_update(15, "green bean"), Ok(AddOrUpdateStatus::Updated));
        assert_eq!(cache.read(&15).unwrap(), Some("green bean"));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_delete() {
        let cache = SynchronizedCache::new();
        cache.add("corn", 13).unwrap();
        assert_eq!(cache.delete(&"corn").unwrap(), Some(13));
        assert_eq!(cache.delete(&"corn").unwrap(), None);
        assert!(cache.is_empty().unwrap());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_mutation_under_read_is_rejected() {
        let cache = SynchronizedCache::new();
        let _reading = cache.lock().read().unwrap();
        assert_eq!(
            cache.add(1, "radish"),
            Err(CacheError::Lock(LockError::UpgradeNotSupported))
        );
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_batch_under_write_hold() {
        let cache = SynchronizedCache::new();
        let batch = cache.lock().write().unwrap();
        for (key, value) in ["lime leaves", "corn", "radish"].into_iter().enumerate() {
            cache.add(key, value).unwrap();
        }
        // Reads nest on the write hold too.
        assert_eq!(cache.len().unwrap(), 3);
        drop(batch);
        assert_eq!(cache.lock().status().owner, None);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn test_calls_from_inside_a_mutation_are_rejected() {
        MEDDLED.with(|cache| {
            cache.add(1, Meddling(1)).unwrap();
            // `add_or_update` compares values while it holds the map mutably.
            assert_eq!(
                cache.add_or_update(1, Meddling(2)),
                Ok(AddOrUpdateStatus::Updated)
            );
            assert_eq!(SEEN_LEN.with(Cell::get), Some(Err(CacheError::Reentrant)));
            assert_eq!(SEEN_DELETE.with(Cell::get), Some(Err(CacheError::Reentrant)));

            // The rejected calls left the map and the lock as they were.
            assert_eq!(cache.len(), Ok(1));
            assert_eq!(cache.read(&1).unwrap().map(|v| v.0), Some(2));
            assert_eq!(cache.lock().status().owner, None);
            assert_eq!(cache.lock().status().self_reads, 0);
        });
    }
}
