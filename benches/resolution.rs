//! Benchmarks for type reference resolution.
//!
//! Compares the first resolution of a reference, which performs the name lookup, against
//! the memoized path taken by every later call. Also measures eager resolution of a
//! whole `TypeRef` table.

extern crate assemblymeta;

use std::{hint::black_box, sync::Arc};

use assemblymeta::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

const TYPE_COUNT: u32 = 256;

fn core_assembly() -> Arc<Assembly> {
    let identity = AssemblyIdentity::parse("Core, Version=1.0.0.0").unwrap();
    let mut core = Assembly::new(identity, TableCounts::new(0, 0, TYPE_COUNT, 0, 0)).unwrap();
    for index in 0..TYPE_COUNT {
        core.set_type_def(
            index,
            TypeDef::new("Core", format!("Type{index}"), TypeAttributes::PUBLIC),
        )
        .unwrap();
    }
    core.publish().unwrap()
}

fn app_assembly(core: &Arc<Assembly>) -> Arc<Assembly> {
    let identity = AssemblyIdentity::parse("App, Version=1.0.0.0").unwrap();
    let mut app = Assembly::new(identity, TableCounts::new(1, TYPE_COUNT, 0, 0, 0)).unwrap();
    app.set_assembly_ref(0, core.clone()).unwrap();
    for index in 0..TYPE_COUNT {
        app.set_type_ref(
            index,
            TypeRef::new("Core", format!("Type{index}"), ResolutionScope::AssemblyRef(0)),
        )
        .unwrap();
    }
    app.publish().unwrap()
}

/// Benchmark the first resolution of a reference, including the lookup in `Core`.
fn bench_first_resolution(c: &mut Criterion) {
    let core = core_assembly();

    c.bench_function("resolve_type_ref_first", |b| {
        b.iter_batched(
            || app_assembly(&core),
            |app| {
                let resolved = app.resolve_type_ref(black_box(TYPE_COUNT / 2)).unwrap();
                black_box(resolved)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark a resolution which hits the memoized definition.
fn bench_memoized_resolution(c: &mut Criterion) {
    let core = core_assembly();
    let app = app_assembly(&core);
    app.resolve_type_ref(TYPE_COUNT / 2).unwrap();

    c.bench_function("resolve_type_ref_memoized", |b| {
        b.iter(|| {
            let resolved = app.resolve_type_ref(black_box(TYPE_COUNT / 2)).unwrap();
            black_box(resolved)
        });
    });
}

/// Benchmark eager parallel resolution of every reference in a fresh assembly.
fn bench_resolve_all(c: &mut Criterion) {
    let core = core_assembly();

    c.bench_function("resolve_all", |b| {
        b.iter_batched(
            || app_assembly(&core),
            |app| black_box(app.resolve_all()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_first_resolution,
    bench_memoized_resolution,
    bench_resolve_all
);
criterion_main!(benches);
