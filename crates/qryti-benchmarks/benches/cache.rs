//! Response cache benchmarks
//!
//! Measures lookups, inserts at capacity (FIFO eviction) and collection
//! invalidation across cache sizes.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qryti_benchmarks::criterion_config;
use qryti_client::{RequestOptions, ResponseCache};
use serde_json::json;

const TTL: Duration = Duration::from_secs(300);

fn filled_cache(size: usize) -> ResponseCache {
    let mut cache = ResponseCache::new(TTL, size);
    for i in 0..size {
        cache.insert(format!("/models/{}_{{}}", i), format!("/models/{}", i), json!({ "id": i }));
    }
    cache
}

fn bench_cache_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_lookup");
    for size in [10usize, 100, 1_000].iter() {
        let mut cache = filled_cache(*size);
        let keys: Vec<String> = (0..*size).map(|i| format!("/models/{}_{{}}", i)).collect();
        let mut index = 0;

        group.bench_function(BenchmarkId::new("hit", size), |b| {
            b.iter(|| {
                let key = &keys[index % keys.len()];
                index += 1;
                black_box(cache.get(key))
            });
        });
    }
    group.finish();
}

fn bench_cache_insert_at_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_insert_evict");
    for size in [10usize, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(1));
        let mut cache = filled_cache(*size);
        let mut next = *size;

        group.bench_function(BenchmarkId::new("capacity", size), |b| {
            b.iter(|| {
                next += 1;
                cache.insert(format!("/reports/{}_{{}}", next), "/reports".to_string(), json!(next));
            });
        });
    }
    group.finish();
}

fn bench_invalidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_invalidate_collection");
    for size in [100usize, 1_000].iter() {
        group.bench_function(BenchmarkId::new("entries", size), |b| {
            b.iter_batched(
                || filled_cache(*size),
                |mut cache| black_box(cache.remove_where(|path| path.starts_with("/models"))),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let options = RequestOptions::new()
        .query("status", "Under Review")
        .query("risk_level", "High")
        .header("X-Request-Source", "bench");

    c.bench_function("cache_key", |b| {
        b.iter(|| black_box(options.cache_key(black_box("/models"))))
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_cache_lookup, bench_cache_insert_at_capacity, bench_invalidation, bench_cache_key
}
criterion_main!(benches);
