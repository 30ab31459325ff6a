//! Benchmark profiles for the Stride crowd-trajectory analysis engine.
//!
//! - [`reference_grid`]: a 20 m square at 0.1 m cells (200×200).
//! - [`crowd_frame`]: a seeded uniform crowd inside a domain.
//! - [`corridor_walls`]: obstacle edges splitting the reference domain.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stride_core::{Frame, ObstacleSet, Vec2};
use stride_grid::{AbstractGrid, GridError, RectDomain};

/// Side of the reference domain in metres.
pub const REFERENCE_SIDE: f32 = 20.0;

/// Cell size of the reference grid in metres.
pub const REFERENCE_CELL: f32 = 0.1;

/// The reference benchmark grid: 200×200 cells over a 20 m square.
pub fn reference_grid() -> Result<AbstractGrid, GridError> {
    let cells = (REFERENCE_SIDE / REFERENCE_CELL).round() as usize;
    let domain = RectDomain::new(Vec2::ZERO, Vec2::new(REFERENCE_SIDE, REFERENCE_SIDE))?;
    AbstractGrid::new(domain, cells, cells)
}

/// `agents` positions drawn uniformly from `domain` with a fixed seed.
pub fn crowd_frame(seed: u64, agents: usize, domain: &RectDomain) -> Frame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (lo, size) = (domain.min_corner(), domain.size());
    Frame::from_positions((0..agents).map(|_| {
        Vec2::new(
            lo.x + rng.random::<f32>() * size.x,
            lo.y + rng.random::<f32>() * size.y,
        )
    }))
}

/// Two interior walls across the reference domain with a gap in each.
pub fn corridor_walls() -> ObstacleSet {
    let third = REFERENCE_SIDE / 3.0;
    let mut walls = ObstacleSet::new();
    walls.add_polygon(
        &[Vec2::new(third, 0.0), Vec2::new(third, REFERENCE_SIDE * 0.45)],
        false,
    );
    walls.add_polygon(
        &[
            Vec2::new(2.0 * third, REFERENCE_SIDE * 0.55),
            Vec2::new(2.0 * third, REFERENCE_SIDE),
        ],
        false,
    );
    walls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_grid_is_200_square() {
        assert_eq!(reference_grid().unwrap().resolution(), (200, 200));
    }

    #[test]
    fn crowd_is_seeded_and_inside() {
        let grid = reference_grid().unwrap();
        let a = crowd_frame(7, 50, grid.domain());
        let b = crowd_frame(7, 50, grid.domain());
        assert_eq!(a, b);
        assert!(a.positions().all(|p| grid.domain().contains(p)));
    }

    #[test]
    fn walls_have_one_edge_each() {
        assert_eq!(corridor_walls().len(), 2);
    }
}
