use rustview::cache::TimestampedLruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, SystemTime};

fn stamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn cache(capacity: usize) -> TimestampedLruCache<&'static str, i32, SystemTime> {
    TimestampedLruCache::new(NonZeroUsize::new(capacity).unwrap())
}

#[test]
fn test_capacity_bound_after_many_distinct_sets() {
    let cache: TimestampedLruCache<u32, u32, SystemTime> =
        TimestampedLruCache::new(NonZeroUsize::new(20).unwrap());
    for i in 0..500 {
        cache.set(i, i * 2, stamp(0));
        assert!(cache.len() <= 20);
    }
    assert_eq!(cache.len(), 20);
    assert_eq!(cache.stats().evictions, 480);

    // The survivors are exactly the last 20 keys, newest first.
    let expected: Vec<u32> = (480..500).rev().collect();
    assert_eq!(cache.keys_by_recency(), expected);
}

#[test]
fn test_read_promotion_decides_eviction() {
    let t0 = stamp(0);
    let cache = cache(2);
    cache.set("a", 1, t0);
    cache.set("b", 2, t0);
    assert_eq!(cache.get(&"a", &t0), Some(1));
    cache.set("c", 3, t0);

    assert_eq!(cache.get(&"b", &t0), None);
    assert_eq!(cache.get(&"a", &t0), Some(1));
    assert_eq!(cache.get(&"c", &t0), Some(3));
}

#[test]
fn test_without_read_oldest_is_evicted() {
    let t0 = stamp(0);
    let cache = cache(2);
    cache.set("a", 1, t0);
    cache.set("b", 2, t0);
    cache.set("c", 3, t0);

    assert_eq!(cache.get(&"a", &t0), None);
    assert_eq!(cache.get(&"b", &t0), Some(2));
}

#[test]
fn test_stale_entry_is_gone_for_every_stamp() {
    let (t1, t2) = (stamp(1), stamp(2));
    let cache = cache(4);
    cache.set("k", 1, t1);

    assert_eq!(cache.get(&"k", &t2), None);
    assert_eq!(cache.get(&"k", &t1), None);
    assert!(!cache.contains(&"k"));
}

#[test]
fn test_same_key_overwrite_keeps_count() {
    let t0 = stamp(0);
    let cache = cache(2);
    cache.set("k", 1, t0);
    cache.set("other", 9, t0);
    cache.set("k", 2, t0);

    assert_eq!(cache.get(&"k", &t0), Some(2));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(&"other", &t0), Some(9));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_set_with_new_stamp_refreshes_entry() {
    let cache = cache(2);
    cache.set("k", 1, stamp(1));
    cache.set("k", 2, stamp(2));

    assert_eq!(cache.get(&"k", &stamp(2)), Some(2));
    assert_eq!(cache.stats().stale, 0);
}

#[test]
fn test_independent_instances_share_nothing() {
    let t0 = stamp(0);
    let images = cache(20);
    let thumbnails = cache(1000);
    images.set("photo.png", 1, t0);

    assert_eq!(thumbnails.get(&"photo.png", &t0), None);
    assert_eq!(images.get(&"photo.png", &t0), Some(1));
    assert_eq!(images.capacity(), 20);
    assert_eq!(thumbnails.capacity(), 1000);
}
