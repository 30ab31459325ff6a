//! Criterion micro-benchmarks for kernel sampling and impulse convolution.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stride_bench::{corridor_walls, crowd_frame, reference_grid, REFERENCE_CELL};
use stride_kernel::{ImpulseSignal, Kernel, KernelKind, Signal};

/// Benchmark: 200 agents on the 200×200 reference grid, per kernel family.
fn bench_convolve_families(c: &mut Criterion) {
    let grid = reference_grid().unwrap();
    let frame = crowd_frame(42, 200, grid.domain());
    let signal = Signal::from(ImpulseSignal::from_frame(*grid.domain(), &frame));

    let mut group = c.benchmark_group("convolve_200_agents");
    for kind in [
        KernelKind::Uniform,
        KernelKind::Biweight,
        KernelKind::Gaussian,
        KernelKind::UniformCircle,
    ] {
        let kernel = Kernel::new(kind, 0.5, REFERENCE_CELL).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kernel, |b, kernel| {
            b.iter(|| {
                let out = kernel.convolve_to_grid(&signal, grid).unwrap();
                black_box(&out);
            });
        });
    }
    group.finish();
}

/// Benchmark: reflection doubles up to four images per impulse.
fn bench_convolve_reflect(c: &mut Criterion) {
    let grid = reference_grid().unwrap();
    let frame = crowd_frame(43, 200, grid.domain());
    let signal = Signal::from(ImpulseSignal::from_frame(*grid.domain(), &frame));
    let kernel = Kernel::builder(KernelKind::Gaussian)
        .sigma(0.5)
        .cell_size(REFERENCE_CELL)
        .reflect(true)
        .build()
        .unwrap();

    c.bench_function("convolve_gaussian_reflect", |b| {
        b.iter(|| {
            let out = kernel.convolve_to_grid(&signal, grid).unwrap();
            black_box(&out);
        });
    });
}

/// Benchmark: adaptive Plaue widths with obstacles in play.
fn bench_convolve_plaue(c: &mut Criterion) {
    let grid = reference_grid().unwrap();
    let frame = crowd_frame(44, 100, grid.domain());
    let signal = Signal::from(ImpulseSignal::from_frame(*grid.domain(), &frame));
    let kernel = Kernel::builder(KernelKind::Plaue)
        .sigma(1.0)
        .cell_size(REFERENCE_CELL)
        .obstacles(Arc::new(corridor_walls()))
        .build()
        .unwrap();

    c.bench_function("convolve_plaue_100_agents", |b| {
        b.iter(|| {
            let out = kernel.convolve_to_grid(&signal, grid).unwrap();
            black_box(&out);
        });
    });
}

criterion_group!(
    benches,
    bench_convolve_families,
    bench_convolve_reflect,
    bench_convolve_plaue
);
criterion_main!(benches);
