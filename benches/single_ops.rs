//! Benchmarks for the clustered index against `BTreeMap`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;
use xyfast::ClusterIndex;

fn generate_keys(n: usize) -> Vec<u64> {
    // Co-prime stride spreads keys without being adversarially random.
    (0..n as u64).map(|i| i * 7).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_keys(size);

        group.bench_with_input(BenchmarkId::new("ClusterIndex", size), &keys, |b, keys| {
            b.iter(|| {
                let mut index = ClusterIndex::new();
                for (i, &key) in keys.iter().enumerate() {
                    index.insert(key, i as u64).unwrap();
                }
                black_box(index)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BTreeMap<u64, u64> = BTreeMap::new();
                for (i, &key) in keys.iter().enumerate() {
                    map.insert(key, i as u64);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_keys(size);

        let mut index = ClusterIndex::new();
        let mut btree: BTreeMap<u64, u64> = BTreeMap::new();
        for (i, &key) in keys.iter().enumerate() {
            index.insert(key, i as u64).unwrap();
            btree.insert(key, i as u64);
        }

        group.bench_with_input(BenchmarkId::new("ClusterIndex", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for &key in keys.iter() {
                    if let Some(v) = index.search(key).unwrap() {
                        sum += v;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for &key in keys.iter() {
                    if let Some(v) = btree.get(&key) {
                        sum += *v;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_predecessor(c: &mut Criterion) {
    let mut group = c.benchmark_group("predecessor");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_keys(size);
        // Probe between stored keys so every query misses and has to walk.
        let probes: Vec<u64> = keys.iter().map(|&k| k + 3).collect();

        let mut index = ClusterIndex::new();
        let mut btree: BTreeMap<u64, u64> = BTreeMap::new();
        for (i, &key) in keys.iter().enumerate() {
            index.insert(key, i as u64).unwrap();
            btree.insert(key, i as u64);
        }

        group.bench_with_input(
            BenchmarkId::new("ClusterIndex", size),
            &probes,
            |b, probes| {
                b.iter(|| {
                    let mut sum = 0u64;
                    for &key in probes.iter() {
                        if let Some((k, _)) = index.predecessor(key).unwrap() {
                            sum += k;
                        }
                    }
                    black_box(sum)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &probes, |b, probes| {
            b.iter(|| {
                let mut sum = 0u64;
                for &key in probes.iter() {
                    if let Some((&k, _)) = btree.range(..key).next_back() {
                        sum += k;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_search, bench_predecessor);
criterion_main!(benches);
