//! Thread-safe, validity-checked LRU cache.
//!
//! # Example
//!
//! ```
//! use rustview::cache::TimestampedLruCache;
//! use std::num::NonZeroUsize;
//!
//! let cache = TimestampedLruCache::new(NonZeroUsize::new(2).unwrap());
//! cache.set("a", 1, 0u64);
//! cache.set("b", 2, 0u64);
//! assert_eq!(cache.get(&"a", &0), Some(1)); // "a" is now most recent
//! cache.set("c", 3, 0u64);                  // evicts "b"
//! assert_eq!(cache.get(&"b", &0), None);
//!
//! // A different stamp is a miss and drops the entry.
//! assert_eq!(cache.get(&"a", &1), None);
//! assert_eq!(cache.get(&"a", &0), None);
//! ```

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::lru::{Insertion, Lookup, LruCore};

/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that returned nothing, stale ones included.
    pub misses: u64,
    /// Misses caused by a validity mismatch.
    pub stale: u64,
    /// Entries dropped to make room for new keys.
    pub evictions: u64,
    /// Entries resident when the snapshot was taken.
    pub resident: usize,
    /// Configured capacity.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0.0 before the first lookup.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded LRU cache whose lookups are validated against a caller-supplied
/// stamp, safe to share between threads.
///
/// One mutex guards the key map and the recency list together. Values are
/// cloned out of the lock, so payloads should be cheap to clone (`Arc`).
pub struct TimestampedLruCache<K, V, T> {
    inner: Mutex<LruCore<K, V, T>>,
    label: &'static str,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V, T> std::fmt::Debug for TimestampedLruCache<K, V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampedLruCache")
            .field("label", &self.label)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<K, V, T> TimestampedLruCache<K, V, T>
where
    K: Eq + Hash + Clone,
    V: Clone,
    T: PartialEq,
{
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCore::new(capacity)),
            label: "cache",
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a cache from a plain count, treating 0 as 1.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
    }

    /// Set the name used in log messages.
    #[must_use]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Name used in log messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    fn lock(&self) -> MutexGuard<'_, LruCore<K, V, T>> {
        // No user code runs under the lock, so a poisoned guard still holds a
        // consistent structure.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the value for `key` if it was stored with `expected`.
    ///
    /// A hit makes `key` the most recently used entry. An entry stored with a
    /// different stamp is removed and reported as a miss.
    pub fn get(&self, key: &K, expected: &T) -> Option<V> {
        let mut core = self.lock();
        match core.get(key, expected) {
            Lookup::Hit(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Stale => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.stale.fetch_add(1, Ordering::Relaxed);
                log::trace!("{}: dropped stale entry", self.label);
                None
            }
        }
    }

    /// Store `value` for `key`, stamped with `validity`, as the most recent
    /// entry. Evicts the least recently used entry if a new key would exceed
    /// the capacity.
    pub fn set(&self, key: K, value: V, validity: T) {
        let outcome = self.lock().set(key, value, validity);
        if let Insertion::Evicted(_) = outcome {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::trace!("{}: evicted least recently used entry", self.label);
        }
    }

    /// Return the cached value, or compute, store and return a fresh one.
    ///
    /// `compute` runs without the lock held. Two threads missing on the same
    /// key may both compute; the later `set` wins. Errors are returned as-is
    /// and nothing is stored, so the next call retries.
    pub fn get_or_insert_with<E, F>(&self, key: K, validity: T, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key, &validity) {
            return Ok(value);
        }
        let value = compute()?;
        self.set(key, value.clone(), validity);
        Ok(value)
    }

    /// Remove `key`. Returns true if it was resident.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of resident entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Returns true if `key` is resident, regardless of its stamp. Does not
    /// affect recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key)
    }

    /// Snapshot of resident keys, most recently used first.
    #[must_use]
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.lock().keys().cloned().collect()
    }

    /// Snapshot of the usage counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let (resident, capacity) = {
            let core = self.lock();
            (core.len(), core.capacity())
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            resident,
            capacity,
        }
    }
}
