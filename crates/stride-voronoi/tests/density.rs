//! Voronoi density sums and the three-site scenario.

use proptest::prelude::*;
use stride_core::Vec2;
use stride_grid::{AbstractGrid, RectDomain};
use stride_voronoi::{Voronoi, UNOWNED};

fn ten_metre_grid(h: f32) -> AbstractGrid {
    let d = RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap();
    let n = (10.0 / h).round() as usize;
    AbstractGrid::new(d, n, n).unwrap()
}

#[test]
fn three_sites_partition_the_domain() {
    let sites = [Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0), Vec2::new(9.0, 1.0)];
    let voronoi = Voronoi::new(100.0).unwrap();
    let map = voronoi.owners(ten_metre_grid(1.0), &sites).unwrap();

    assert!(!map.owners().cells().contains(&UNOWNED));
    assert_eq!(map.areas().iter().sum::<usize>(), 100);
    assert!(map.areas().iter().all(|&a| a > 0));

    let density = voronoi.density(ten_metre_grid(1.0), &sites).unwrap();
    assert!((density.sum() - 3.0).abs() < 1e-5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn density_sums_to_occupied_site_count(
        raw in prop::collection::vec((0.0f32..10.0, 0.0f32..10.0), 1..25),
    ) {
        let sites: Vec<Vec2> = raw.into_iter().map(Vec2::from).collect();
        let voronoi = Voronoi::new(f32::INFINITY).unwrap();
        let map = voronoi.owners(ten_metre_grid(0.5), &sites).unwrap();
        prop_assert!(!map.owners().cells().contains(&UNOWNED));

        let total = map.density().sum();
        prop_assert!((total - map.occupied() as f64).abs() < 1e-4);
    }
}
