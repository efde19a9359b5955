//! Engine benchmarks for GroveKV
//!
//! Benchmarks for:
//! - Set throughput, sequential vs scrambled key order
//! - Get cost on committed trees (every call re-resolves from the root)
//! - Commit cost of a single-key change on a populated tree

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use grovekv::Engine;
use tempfile::TempDir;

/// Deterministic scrambled key order; 1_000_003 is prime, so this visits
/// every key in [0, count) exactly once for any smaller count.
fn scrambled_keys(count: i64) -> Vec<i64> {
    (0..count).map(|i| (i * 1_000_003) % count).collect()
}

fn populated_engine(count: i64) -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open_path(dir.path().join("bench.grove")).unwrap();
    for &key in &scrambled_keys(count) {
        engine.set(key, &[0xAB; 100][..]).unwrap();
    }
    engine.commit().unwrap();
    (dir, engine)
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/set");
    // Sequential insertion degenerates the tree, making each batch quadratic
    group.sample_size(10);

    for size in [1_000i64, 10_000].iter() {
        let sequential: Vec<i64> = (0..*size).collect();
        let scrambled = scrambled_keys(*size);

        for (order, keys) in [("sequential", &sequential), ("scrambled", &scrambled)] {
            group.throughput(Throughput::Elements(*size as u64));
            group.bench_with_input(
                BenchmarkId::new(order, size),
                keys,
                |b, keys| {
                    b.iter_batched(
                        || {
                            let dir = TempDir::new().unwrap();
                            let engine =
                                Engine::open_path(dir.path().join("bench.grove")).unwrap();
                            (dir, engine)
                        },
                        |(_dir, mut engine)| {
                            for &key in keys.iter() {
                                engine.set(key, &[0xAB; 100][..]).unwrap();
                            }
                            engine.commit().unwrap();
                            black_box(engine.len().unwrap())
                        },
                        BatchSize::PerIteration,
                    );
                },
            );
        }
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/get");

    for size in [1_000i64, 10_000].iter() {
        let (_dir, mut engine) = populated_engine(*size);
        let keys = scrambled_keys(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut found = 0u64;
                for &key in &keys {
                    if engine.get(key).is_ok() {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });
    }

    group.finish();
}

fn bench_get_miss(c: &mut Criterion) {
    let (_dir, mut engine) = populated_engine(10_000);

    c.bench_function("engine/get_miss", |b| {
        b.iter(|| black_box(engine.get(1_000_000).is_err()));
    });
}

fn bench_commit_single_key(c: &mut Criterion) {
    let (_dir, mut engine) = populated_engine(10_000);
    let mut next = 0i64;

    c.bench_function("engine/commit_single_key", |b| {
        b.iter(|| {
            next = (next + 1) % 10_000;
            engine.set(next, "updated").unwrap();
            engine.commit().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_get_miss,
    bench_commit_single_key,
);
criterion_main!(benches);
