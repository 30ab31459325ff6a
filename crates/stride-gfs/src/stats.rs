//! Running frame count and value range.

use stride_core::GridElement;
use stride_grid::DataGrid;

/// Frame count and global extrema of a set of grids.
///
/// Merging is commutative and associative, so per-producer reports can be
/// combined in any order. NaN cells never become an extremum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStats<T> {
    count: usize,
    range: Option<(T, T)>,
}

impl<T: GridElement> Default for GridStats<T> {
    fn default() -> Self {
        Self {
            count: 0,
            range: None,
        }
    }
}

impl<T: GridElement> GridStats<T> {
    /// No grids observed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of a single grid.
    pub fn of_grid(grid: &DataGrid<T>) -> Self {
        Self {
            count: 1,
            range: grid.min_max(),
        }
    }

    /// Fold one more grid in.
    pub fn observe(&mut self, grid: &DataGrid<T>) {
        self.merge(&Self::of_grid(grid));
    }

    /// Fold another report in.
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.range = match (self.range, other.range) {
            (None, r) | (r, None) => r,
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => Some((
                if b_lo < a_lo { b_lo } else { a_lo },
                if b_hi > a_hi { b_hi } else { a_hi },
            )),
        };
    }

    /// Grids observed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Global `(min, max)`, or `None` before any non-NaN cell.
    pub fn range(&self) -> Option<(T, T)> {
        self.range
    }

    /// Global minimum, zero when nothing was observed.
    pub fn min(&self) -> T {
        self.range.map_or(T::ZERO, |(lo, _)| lo)
    }

    /// Global maximum, zero when nothing was observed.
    pub fn max(&self) -> T {
        self.range.map_or(T::ZERO, |(_, hi)| hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stride_core::Vec2;
    use stride_grid::{AbstractGrid, RectDomain};

    fn grid_of(cells: Vec<i32>) -> DataGrid<i32> {
        let d = RectDomain::new(Vec2::ZERO, Vec2::new(1.0, 1.0)).unwrap();
        let n = cells.len();
        DataGrid::from_cells(AbstractGrid::new(d, n, 1).unwrap(), cells).unwrap()
    }

    #[test]
    fn empty_stats_report_zero() {
        let s = GridStats::<f32>::new();
        assert_eq!((s.count(), s.min(), s.max()), (0, 0.0, 0.0));
        assert_eq!(s.range(), None);
    }

    #[test]
    fn observe_tracks_extrema() {
        let mut s = GridStats::new();
        s.observe(&grid_of(vec![3, -1, 4]));
        s.observe(&grid_of(vec![1, 5, 9]));
        assert_eq!(s.count(), 2);
        assert_eq!(s.range(), Some((-1, 9)));
    }

    proptest! {
        #[test]
        fn merge_is_order_independent(
            a in prop::collection::vec(-1000i32..1000, 1..10),
            b in prop::collection::vec(-1000i32..1000, 1..10),
            c in prop::collection::vec(-1000i32..1000, 1..10),
        ) {
            let (ga, gb, gc) = (grid_of(a), grid_of(b), grid_of(c));
            let mut left = GridStats::of_grid(&ga);
            left.merge(&GridStats::of_grid(&gb));
            left.merge(&GridStats::of_grid(&gc));

            let mut right = GridStats::of_grid(&gc);
            let mut tail = GridStats::of_grid(&gb);
            tail.merge(&GridStats::of_grid(&ga));
            right.merge(&tail);

            prop_assert_eq!(left, right);
        }
    }
}
