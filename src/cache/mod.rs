//! Bounded, validity-checked LRU caching for decoded images and thumbnails.
//!
//! # Architecture
//!
//! * [`lru`]: the single-threaded arena structure (key map plus index-linked
//!   recency list).
//! * [`entry`]: a value paired with the stamp it was computed against.
//! * [`timestamped`]: the shared, mutex-guarded cache the loaders own.
//!
//! # Cache Invalidation
//!
//! Every lookup carries the caller's current stamp for the resource (the
//! loaders pass the file's modification time). An entry stored with a
//! different stamp is removed on the spot and the lookup is reported as a
//! miss, so stale pixels are never returned. Staleness is only discovered
//! lazily; nothing scans the cache in the background.

pub mod entry;
pub mod lru;
pub mod timestamped;

pub use entry::CacheEntry;
pub use lru::{Insertion, Lookup, LruCore};
pub use timestamped::{CacheStats, TimestampedLruCache};
