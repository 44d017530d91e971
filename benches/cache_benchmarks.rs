use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rustview::cache::TimestampedLruCache;
use rustview::library::PathKey;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn stamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

// 1. Lookups on a warm cache
fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");

    for capacity in [20usize, 1000] {
        let cache: TimestampedLruCache<usize, usize, SystemTime> =
            TimestampedLruCache::with_capacity(capacity);
        for i in 0..capacity {
            cache.set(i, i, stamp(0));
        }

        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % cap;
                black_box(cache.get(&i, &stamp(0)));
            })
        });
    }
    group.finish();
}

// 2. Inserts that always evict
fn bench_set_evicting(c: &mut Criterion) {
    let cache: TimestampedLruCache<usize, usize, SystemTime> =
        TimestampedLruCache::with_capacity(1000);

    c.bench_function("set_evicting_1000", |b| {
        let mut i = 0;
        b.iter(|| {
            i += 1;
            cache.set(black_box(i), i, stamp(0));
        })
    });
}

// 3. Every lookup finds an outdated stamp and gets re-filled
fn bench_stale_churn(c: &mut Criterion) {
    let cache: TimestampedLruCache<usize, usize, u64> = TimestampedLruCache::with_capacity(256);

    c.bench_function("stale_churn_256", |b| {
        let mut generation = 0u64;
        b.iter(|| {
            generation += 1;
            for key in 0..256 {
                if cache.get(&key, &generation).is_none() {
                    cache.set(key, key, generation);
                }
            }
        })
    });
}

// 4. Path keys, as the loaders use them
fn bench_path_keys(c: &mut Criterion) {
    let paths: Vec<String> = (0..1000)
        .map(|i| format!("/Users/someone/Pictures/Caf\u{0065}\u{0301}/IMG_{i:04}.JPG"))
        .collect();
    let cache: TimestampedLruCache<PathKey, usize, SystemTime> =
        TimestampedLruCache::with_capacity(1000);

    c.bench_function("path_key_set_get_1000", |b| {
        b.iter(|| {
            for (i, path) in paths.iter().enumerate() {
                let key = PathKey::new(Path::new(path));
                if cache.get(&key, &stamp(1)).is_none() {
                    cache.set(key, i, stamp(1));
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_set_evicting,
    bench_stale_churn,
    bench_path_keys
);
criterion_main!(benches);
