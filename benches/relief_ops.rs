//! Benchmarks for grid construction and displacement.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relief::algo::smooth::{smooth_region, SmoothOptions};
use relief::prelude::*;

fn create_patch(n: usize) -> (SurfaceMesh, Patch) {
    let mesh = build_vertical_grid(n, n, 0.1, 10.0).unwrap();
    let patch = Patch::from_mesh(&mesh).unwrap();
    (mesh, patch)
}

fn create_hump() -> Curve {
    Curve::new(vec![
        ControlSegment::new(
            UvPoint::new(0.0, 1.0),
            UvPoint::new(0.1, 0.4),
            UvPoint::new(0.35, 0.3),
            UvPoint::new(0.5, 0.3),
        ),
        ControlSegment::new(
            UvPoint::new(0.5, 0.3),
            UvPoint::new(0.65, 0.3),
            UvPoint::new(0.9, 0.4),
            UvPoint::new(1.0, 1.0),
        ),
    ])
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_grid");
    for n in [16, 64, 128] {
        let (_, patch) = create_patch(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &patch, |b, patch| {
            b.iter(|| build_grid(black_box(patch), &GridOptions::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_displacement(c: &mut Criterion) {
    let curve = create_hump();
    let options = ReliefOptions::default();

    let mut group = c.benchmark_group("compute_displacement");
    for n in [16, 64, 128] {
        let (_, patch) = create_patch(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &patch, |b, patch| {
            b.iter(|| compute_displacement(black_box(patch), &curve, &curve, &options).unwrap());
        });
    }
    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let (mesh, patch) = create_patch(128);
    let map = compute_displacement(&patch, &create_hump(), &create_hump(), &ReliefOptions::default()).unwrap();
    let region: Vec<VertexId> = mesh.vertex_ids().collect();

    c.bench_function("smooth_region_128_parallel", |b| {
        b.iter_batched(
            || {
                let mut m = mesh.clone();
                apply_displacement(&mut m, &patch, &map).unwrap();
                m
            },
            |mut m| smooth_region(&mut m, &region, &SmoothOptions::default()),
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_function("smooth_region_128_sequential", |b| {
        b.iter_batched(
            || {
                let mut m = mesh.clone();
                apply_displacement(&mut m, &patch, &map).unwrap();
                m
            },
            |mut m| smooth_region(&mut m, &region, &SmoothOptions::default().sequential()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_grid, bench_displacement, bench_smoothing);
criterion_main!(benches);
