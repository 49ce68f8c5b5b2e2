//! # Arena Benchmark
//!
//! Bump insertion with growth, hole accumulation, and compaction cost.
//!
//! Run with: `cargo bench --package strata_core --bench arena_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{Arena, Position, VectorContainer};

const RECORD: [u8; 24] = [7u8; 24];

/// Insert `count` records starting from a tiny buffer, forcing repeated doubling.
fn bench_insert_with_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_insert");

    for count in [1_000u32, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut arena: Arena<u32> = Arena::new(64, 0.1);
                for id in 0..count {
                    black_box(arena.insert(id, &RECORD).ok());
                }
                arena.capacity()
            });
        });
    }

    group.finish();
}

/// Full compaction of a half-empty arena.
fn bench_defragment(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_defragment");

    for count in [1_000u32, 10_000, 100_000] {
        let mut template: Arena<u32> = Arena::new(64, 1.0);
        for id in 0..count {
            let _ = template.insert(id, &RECORD);
        }
        for id in (0..count).step_by(2) {
            let _ = template.remove(id);
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &template, |b, template| {
            b.iter_batched(
                || template.clone(),
                |mut arena| black_box(arena.defragment().len()),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Churn through the threshold: every removal checks it.
fn bench_remove_with_threshold(c: &mut Criterion) {
    c.bench_function("vector_remove_10k", |b| {
        b.iter_batched(
            || {
                let mut positions = VectorContainer::<Position>::new(10_000, 0.1);
                let ids: Vec<_> = (0..10_000)
                    .filter_map(|i| positions.push(Position::new(i as f32, 0.0)).ok())
                    .collect();
                (positions, ids)
            },
            |(mut positions, ids)| {
                for id in ids.iter().step_by(3) {
                    black_box(positions.remove(*id).ok());
                }
                positions.len()
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_insert_with_growth,
    bench_defragment,
    bench_remove_with_threshold,
);

criterion_main!(benches);
