//! Single-threaded arena LRU with validity-stamped entries.
//!
//! Nodes live in a compact `Vec` and are linked into a recency list through
//! `prev`/`next` indices; a `HashMap` maps each key to its slot. Removal uses
//! `swap_remove` and re-links the node that moved into the vacated slot, so the
//! arena never contains holes.
//!
//! This type does no locking. [`TimestampedLruCache`](super::TimestampedLruCache)
//! wraps it in a mutex for shared use.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use super::entry::CacheEntry;

/// Result of a validity-checked lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, V> {
    /// Key resident and stamped with the expected validity; now most recent.
    Hit(&'a V),
    /// Key not resident.
    Miss,
    /// Key was resident with a different stamp and has been removed.
    Stale,
}

impl<'a, V> Lookup<'a, V> {
    /// Returns the value for a hit.
    #[must_use]
    pub fn value(self) -> Option<&'a V> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Stale => None,
        }
    }
}

/// Result of storing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<K> {
    /// A new key was added without evicting anything.
    Inserted,
    /// An already resident key had its value and stamp replaced.
    Replaced,
    /// A new key was added and the given least-recently-used key was evicted.
    Evicted(K),
}

#[derive(Debug)]
struct Node<K, V, T> {
    key: K,
    entry: CacheEntry<V, T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded LRU map whose lookups are checked against a validity stamp.
pub struct LruCore<K, V, T> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V, T>>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used, first to be evicted.
    tail: Option<usize>,
    capacity: NonZeroUsize,
}

impl<K, V, T> fmt::Debug for LruCore<K, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.nodes.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K, V, T> LruCore<K, V, T>
where
    K: Eq + Hash + Clone,
    T: PartialEq,
{
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity.get()),
            nodes: Vec::with_capacity(capacity.get()),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Maximum number of resident entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `key` is resident, without touching recency or
    /// checking validity.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Look at an entry without promoting it or checking validity.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&CacheEntry<V, T>> {
        self.map.get(key).map(|&idx| &self.nodes[idx].entry)
    }

    /// Look up `key`, accepting it only if it was stored with `expected`.
    ///
    /// A hit promotes the key to most recently used. A stamp mismatch removes
    /// the entry before returning [`Lookup::Stale`].
    pub fn get(&mut self, key: &K, expected: &T) -> Lookup<'_, V> {
        let Some(&idx) = self.map.get(key) else {
            return Lookup::Miss;
        };

        if !self.nodes[idx].entry.is_valid_for(expected) {
            self.remove_at(idx);
            return Lookup::Stale;
        }

        self.promote(idx);
        Lookup::Hit(&self.nodes[idx].entry.value)
    }

    /// Store `value` under `key` with the given stamp and make it most recent.
    ///
    /// Overwriting a resident key never evicts. Inserting a new key into a
    /// full cache evicts exactly the least recently used entry.
    pub fn set(&mut self, key: K, value: V, validity: T) -> Insertion<K> {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].entry = CacheEntry::new(value, validity);
            self.promote(idx);
            return Insertion::Replaced;
        }

        let mut evicted = None;
        if self.nodes.len() >= self.capacity.get() {
            if let Some(lru) = self.tail {
                evicted = Some(self.remove_at(lru).key);
            }
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            entry: CacheEntry::new(value, validity),
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.push_front(idx);

        match evicted {
            Some(key) => Insertion::Evicted(key),
            None => Insertion::Inserted,
        }
    }

    /// Remove `key`, returning its entry if it was resident.
    pub fn remove(&mut self, key: &K) -> Option<CacheEntry<V, T>> {
        let idx = *self.map.get(key)?;
        Some(self.remove_at(idx).entry)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate keys from most to least recently used.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, T> {
        Keys {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(old_head) = self.head {
            self.nodes[old_head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn remove_at(&mut self, idx: usize) -> Node<K, V, T> {
        self.detach(idx);
        let node = self.nodes.swap_remove(idx);
        self.map.remove(&node.key);

        // The former last node now lives at `idx`; point its neighbours and
        // its map slot at the new position.
        if idx < self.nodes.len() {
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.map.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }

        node
    }
}

/// Iterator over keys in recency order, most recent first.
pub struct Keys<'a, K, V, T> {
    nodes: &'a [Node<K, V, T>],
    cursor: Option<usize>,
}

impl<'a, K, V, T> Iterator for Keys<'a, K, V, T> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.cursor?];
        self.cursor = node.next;
        Some(&node.key)
    }
}
