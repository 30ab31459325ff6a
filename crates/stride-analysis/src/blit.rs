//! Block assignment of per-agent values.

use stride_core::Vec2;
use stride_grid::DataGrid;

/// Assign `value` to the `(2·radius + 1)²` cell block centred on the cell
/// containing `p`, clipped to the grid. Points outside the grid domain are
/// ignored.
///
/// Later calls overwrite earlier ones where blocks overlap, so agents are
/// drawn in record order.
pub fn blit(grid: &mut DataGrid<f32>, p: Vec2, radius: usize, value: f32) {
    if !p.is_finite() || !grid.domain().contains(p) {
        return;
    }
    let (nx, ny) = grid.resolution();
    let (ci, cj) = grid.grid().cell_of(p);
    let i_hi = (ci + radius).min(nx - 1);
    let j_hi = (cj + radius).min(ny - 1);
    for i in ci.saturating_sub(radius)..=i_hi {
        for j in cj.saturating_sub(radius)..=j_hi {
            grid.set(i, j, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_grid::{AbstractGrid, RectDomain};

    fn grid() -> DataGrid<f32> {
        let d = RectDomain::new(Vec2::ZERO, Vec2::new(5.0, 5.0)).unwrap();
        DataGrid::new(AbstractGrid::new(d, 5, 5).unwrap())
    }

    #[test]
    fn block_is_clipped_at_the_edge() {
        let mut g = grid();
        blit(&mut g, Vec2::new(0.5, 0.5), 1, 2.0);
        assert_eq!(g.cells().iter().filter(|&&v| v == 2.0).count(), 4);
        assert_eq!(g.get(1, 1), Some(2.0));
        assert_eq!(g.get(2, 2), Some(0.0));
    }

    #[test]
    fn zero_radius_writes_one_cell() {
        let mut g = grid();
        blit(&mut g, Vec2::new(2.5, 3.5), 0, 1.5);
        assert_eq!(g.sum(), 1.5);
        assert_eq!(g.get(2, 3), Some(1.5));
    }

    #[test]
    fn outside_points_are_ignored() {
        let mut g = grid();
        blit(&mut g, Vec2::new(-1.0, 2.0), 3, 9.0);
        blit(&mut g, Vec2::new(f32::NAN, 2.0), 3, 9.0);
        assert_eq!(g.sum(), 0.0);
    }
}
