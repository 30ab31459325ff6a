//! Convolution scenarios and mass invariants across kernel families.

use proptest::prelude::*;
use stride_core::Vec2;
use stride_grid::{AbstractGrid, DataGrid, RectDomain};
use stride_kernel::{ImpulseSignal, Kernel, KernelKind, Signal};

// ── Helpers ─────────────────────────────────────────────────────

fn square(size: f32) -> RectDomain {
    RectDomain::new(Vec2::ZERO, Vec2::new(size, size)).unwrap()
}

fn grid(size: f32, h: f32) -> AbstractGrid {
    let n = (size / h).round() as usize;
    AbstractGrid::new(square(size), n, n).unwrap()
}

fn impulses(domain: RectDomain, points: Vec<Vec2>) -> Signal {
    ImpulseSignal::new(domain, points).into()
}

fn max_cell(g: &DataGrid<f32>) -> ((usize, usize), f32) {
    let (nx, ny) = g.resolution();
    let mut best = ((0, 0), f32::MIN);
    for i in 0..nx {
        for j in 0..ny {
            let v = g.get(i, j).unwrap();
            if v > best.1 {
                best = ((i, j), v);
            }
        }
    }
    best
}

/// Nine impulses well inside a 10 m square, off the cell centres.
fn interior_cluster() -> Vec<Vec2> {
    let mut pts = Vec::new();
    for a in 0..3 {
        for b in 0..3 {
            pts.push(Vec2::new(4.03 + a as f32, 4.17 + b as f32));
        }
    }
    pts
}

// ── Scenarios ───────────────────────────────────────────────────

#[test]
fn single_gaussian_impulse_peaks_at_its_cell() {
    let kernel = Kernel::new(KernelKind::Gaussian, 1.0, 0.1).unwrap();
    let out = kernel
        .convolve_to_grid(
            &impulses(square(10.0), vec![Vec2::new(5.0, 5.0)]),
            grid(10.0, 0.1),
        )
        .unwrap();
    let (cell, peak) = max_cell(&out);
    assert_eq!(cell, (50, 50));
    let expected = 0.01 / (2.0 * std::f32::consts::PI);
    assert!((peak - expected).abs() < 1e-6, "peak {peak} vs {expected}");
}

#[test]
fn dense_uniform_impulses_and_edge_reflection() {
    let domain = square(10.0);
    let g = grid(10.0, 1.0);
    let centres: Vec<Vec2> = (0..10)
        .flat_map(|i| (0..10).map(move |j| Vec2::new(i as f32 + 0.5, j as f32 + 0.5)))
        .collect();

    let plain = Kernel::new(KernelKind::Uniform, 2.0, 1.0).unwrap();
    assert_eq!(plain.samples_2d().unwrap().at(1, 1), 0.25);
    let out = plain
        .convolve_to_grid(&impulses(domain, centres.clone()), g)
        .unwrap();
    // One agent per square metre: interior cells hold one unit.
    assert_eq!(out.get(5, 5), Some(1.0));
    assert_eq!(out.get(0, 5), Some(0.75));
    assert_eq!(out.get(0, 0), Some(0.5625));

    let mirrored = Kernel::builder(KernelKind::Uniform)
        .sigma(2.0)
        .cell_size(1.0)
        .reflect(true)
        .build()
        .unwrap();
    let out = mirrored.convolve_to_grid(&impulses(domain, centres), g).unwrap();
    assert_eq!(out.get(5, 5), Some(1.0));
    assert_eq!(out.get(0, 5), Some(1.0));
    assert_eq!(out.get(9, 4), Some(1.0));
    // Edge images restore the corner up to its missing diagonal neighbour.
    assert_eq!(out.get(0, 0), Some(0.9375));
    assert_eq!(out.get(9, 9), Some(0.9375));
}

#[test]
fn adaptive_kernel_tightens_close_pairs() {
    let domain = square(10.0);
    let g = grid(10.0, 0.05);
    let pair = vec![Vec2::new(5.0, 5.0), Vec2::new(5.5, 5.0)];

    let plaue = Kernel::new(KernelKind::Plaue, 1.0, 0.05).unwrap();
    let signal = ImpulseSignal::new(domain, pair.clone());
    for (_, s) in plaue.adaptive_sigmas(&signal) {
        assert!((s - 0.5).abs() < 1e-6);
    }
    let adaptive = plaue.convolve_to_grid(&signal.into(), g).unwrap();

    let gaussian = Kernel::new(KernelKind::Gaussian, 1.0, 0.05).unwrap();
    let fixed = gaussian.convolve_to_grid(&impulses(domain, pair), g).unwrap();

    let (_, adaptive_peak) = max_cell(&adaptive);
    let (_, fixed_peak) = max_cell(&fixed);
    assert!(
        adaptive_peak > 2.0 * fixed_peak,
        "adaptive {adaptive_peak} vs fixed {fixed_peak}"
    );
    // Both still carry roughly two units of mass.
    assert!((adaptive.sum() - 2.0).abs() < 0.05);
}

// ── Invariants ──────────────────────────────────────────────────

fn mass_per_impulse(kind: KernelKind, sigma: f32, h: f32) -> f64 {
    let kernel = Kernel::new(kind, sigma, h).unwrap();
    let pts = interior_cluster();
    let n = pts.len() as f64;
    let out = kernel
        .convolve_to_grid(&impulses(square(10.0), pts), grid(10.0, h))
        .unwrap();
    out.sum() / n
}

#[test]
fn interior_impulses_conserve_mass() {
    let cases = [
        (KernelKind::Gaussian, 0.5, 0.05, 0.9946),
        (KernelKind::Gaussian, 0.5, 0.1, 0.9946),
        (KernelKind::Triangle, 0.5, 0.05, 1.0),
        (KernelKind::Biweight, 0.5, 0.05, 1.0),
        (KernelKind::UniformCircle, 1.25, 0.0625, 1.0),
        (KernelKind::Uniform, 0.625, 0.125, 1.0),
    ];
    for (kind, sigma, h, expected) in cases {
        let mass = mass_per_impulse(kind, sigma, h);
        assert!(
            (mass - expected).abs() < 1e-2,
            "{kind} σ={sigma} h={h}: mass {mass}"
        );
    }
}

#[test]
fn uniform_mass_is_independent_of_resolution() {
    for h in [1.0, 0.5, 0.4, 0.25] {
        let kernel = Kernel::new(KernelKind::Uniform, 2.0, h).unwrap();
        let out = kernel
            .convolve_to_grid(
                &impulses(square(10.0), vec![Vec2::new(5.1, 5.1)]),
                grid(10.0, h),
            )
            .unwrap();
        assert!((out.sum() - 1.0).abs() < 1e-5, "h={h}: mass {}", out.sum());
    }
}

#[test]
fn centred_impulse_ignores_reflection() {
    let g = grid(10.0, 0.1);
    for kind in [KernelKind::Gaussian, KernelKind::Biweight, KernelKind::UniformCircle] {
        let signal = impulses(square(10.0), vec![Vec2::new(5.0, 5.0)]);
        let plain = Kernel::new(kind, 1.0, 0.1).unwrap();
        let mirrored = Kernel::builder(kind)
            .sigma(1.0)
            .cell_size(0.1)
            .reflect(true)
            .build()
            .unwrap();
        assert_eq!(
            plain.convolve_to_grid(&signal, g).unwrap(),
            mirrored.convolve_to_grid(&signal, g).unwrap(),
            "{kind}"
        );
    }
}

#[test]
fn convolve_domain_outside_signal_domain_is_rejected() {
    let kernel = Kernel::new(KernelKind::Gaussian, 1.0, 0.1).unwrap();
    let small = impulses(square(5.0), vec![Vec2::new(1.0, 1.0)]);
    assert!(matches!(
        kernel.convolve_to_grid(&small, grid(10.0, 0.1)),
        Err(stride_kernel::KernelError::InvalidDomain { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn separable_table_is_outer_product(
        kind_idx in 0usize..4,
        sigma in 0.5f32..2.0,
        h in 0.05f32..0.2,
    ) {
        let kind = [
            KernelKind::Uniform,
            KernelKind::Triangle,
            KernelKind::Biweight,
            KernelKind::Gaussian,
        ][kind_idx];
        let kernel = Kernel::new(kind, sigma, h).unwrap();
        let s1 = kernel.samples_1d().unwrap();
        let s2 = kernel.samples_2d().unwrap();
        prop_assert_eq!(s2.shape(), (s1.len(), s1.len()));
        for a in 0..s1.len() {
            for b in 0..s1.len() {
                prop_assert!((s2.at(a, b) - s1[a] * s1[b]).abs() < 1e-6);
            }
        }
    }
}
