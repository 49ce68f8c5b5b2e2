//! # Registry Benchmark
//!
//! Component attach, group promotion, and view iteration over pooled versus
//! grouped storage.
//!
//! Run with: `cargo bench --package strata_core --bench registry_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{Health, Position, Registry, Velocity};

const ENTITY_COUNT: usize = 10_000;

fn populate(registry: &mut Registry, count: usize) {
    for i in 0..count {
        let e = registry.create_entity();
        let f = i as f32;
        registry.add_component(e, Position::new(f, f));
        registry.add_component(e, Velocity::new(0.1, 0.2));
        if i % 4 == 0 {
            registry.add_component(e, Health::full(100));
        }
    }
}

/// Attach components with and without a group declared up front.
fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");

    for grouped in [false, true] {
        group.bench_with_input(BenchmarkId::from_parameter(grouped), &grouped, |b, &grouped| {
            b.iter(|| {
                let mut registry = Registry::new();
                if grouped {
                    registry.declare_group::<(Position, Velocity)>();
                }
                populate(&mut registry, ENTITY_COUNT);
                registry.stats().components
            });
        });
    }

    group.finish();
}

/// Declaring a group over an already populated registry migrates everyone.
fn bench_late_declaration(c: &mut Criterion) {
    c.bench_function("declare_group_after_10k", |b| {
        b.iter_batched(
            || {
                let mut registry = Registry::new();
                populate(&mut registry, ENTITY_COUNT);
                registry
            },
            |mut registry| black_box(registry.declare_group::<(Position, Velocity)>()),
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Sum positions through a view, pooled versus grouped.
fn bench_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_position_velocity");

    for grouped in [false, true] {
        let mut registry = Registry::new();
        if grouped {
            registry.declare_group::<(Position, Velocity)>();
        }
        populate(&mut registry, ENTITY_COUNT);

        group.bench_with_input(BenchmarkId::from_parameter(grouped), &registry, |b, registry| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for entry in registry.view::<(Position, Velocity)>() {
                    let (position, velocity) = entry.values();
                    sum += position.x + velocity.x;
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_populate, bench_late_declaration, bench_view);

criterion_main!(benches);
