//! Uniform cell tessellations of a domain and dense per-cell data.

use stride_core::{GridElement, Vec2};

use crate::array::Array2;
use crate::domain::RectDomain;
use crate::error::GridError;

/// A clipped, in-range cell index `(i, j)`.
pub type CellIndex = (usize, usize);

/// A rectangular domain split into `nx × ny` equal cells.
///
/// Cell `(i, j)` covers `[x0 + i·cx, x0 + (i+1)·cx] × [y0 + j·cy, y0 + (j+1)·cy]`
/// where `(cx, cy)` is [`cell_size`](AbstractGrid::cell_size).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbstractGrid {
    domain: RectDomain,
    nx: usize,
    ny: usize,
}

impl AbstractGrid {
    /// Tessellate `domain` into `nx × ny` cells.
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidResolution`] for a zero resolution or a domain
    /// with zero width or height.
    pub fn new(domain: RectDomain, nx: usize, ny: usize) -> Result<Self, GridError> {
        if nx == 0 || ny == 0 {
            return Err(GridError::InvalidResolution {
                reason: format!("resolution must be positive, got {nx}x{ny}"),
            });
        }
        if domain.width() <= 0.0 || domain.height() <= 0.0 {
            return Err(GridError::InvalidResolution {
                reason: format!(
                    "domain {}x{} has no area to tessellate",
                    domain.width(),
                    domain.height()
                ),
            });
        }
        Ok(Self { domain, nx, ny })
    }

    /// Tessellate into square cells of side `cell_size`.
    ///
    /// The resolution is the rounded number of whole cells that fit
    /// (at least one per axis); the domain is then resized to exactly
    /// `nx · cell_size` by `ny · cell_size` from `min`.
    pub fn with_cell_size(min: Vec2, size: Vec2, cell_size: f32) -> Result<Self, GridError> {
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(GridError::InvalidResolution {
                reason: format!("cell size must be positive and finite, got {cell_size}"),
            });
        }
        let nx = ((f64::from(size.x) / f64::from(cell_size)).round() as usize).max(1);
        let ny = ((f64::from(size.y) / f64::from(cell_size)).round() as usize).max(1);
        let domain = RectDomain::new(
            min,
            Vec2::new(nx as f32 * cell_size, ny as f32 * cell_size),
        )?;
        Self::new(domain, nx, ny)
    }

    /// The tessellated domain.
    pub fn domain(&self) -> &RectDomain {
        &self.domain
    }

    /// Resolution `(nx, ny)`.
    pub fn resolution(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Cells along x.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Cells along y.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Cell extent `(w / nx, h / ny)`.
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(
            self.domain.width() / self.nx as f32,
            self.domain.height() / self.ny as f32,
        )
    }

    /// Area of one cell.
    pub fn cell_area(&self) -> f32 {
        let c = self.cell_size();
        c.x * c.y
    }

    /// True when cells are square to within a relative `1e-5`.
    pub fn is_square(&self) -> bool {
        let c = self.cell_size();
        (c.x - c.y).abs() <= 1e-5 * c.x.max(c.y)
    }

    /// Unclipped cell coordinates of a world point.
    ///
    /// Points outside the domain map to negative or `>= n` indices; the
    /// kernel splat relies on this for reflected impulses.
    pub fn cell_of_unclipped(&self, p: Vec2) -> (i64, i64) {
        let min = self.domain.min_corner();
        let fx = f64::from(p.x - min.x) / f64::from(self.domain.width()) * self.nx as f64;
        let fy = f64::from(p.y - min.y) / f64::from(self.domain.height()) * self.ny as f64;
        (fx.floor() as i64, fy.floor() as i64)
    }

    /// The cell containing `p`, clipped to `[0, nx-1] × [0, ny-1]`.
    pub fn cell_of(&self, p: Vec2) -> CellIndex {
        let (i, j) = self.cell_of_unclipped(p);
        (
            i.clamp(0, self.nx as i64 - 1) as usize,
            j.clamp(0, self.ny as i64 - 1) as usize,
        )
    }

    /// World position of the centre of cell `(i, j)`.
    ///
    /// Accepts off-grid indices and extrapolates.
    pub fn cell_center(&self, i: i64, j: i64) -> Vec2 {
        let min = self.domain.min_corner();
        let c = self.cell_size();
        Vec2::new(
            min.x + (i as f32 + 0.5) * c.x,
            min.y + (j as f32 + 0.5) * c.y,
        )
    }

    /// World rectangle covered by cell `(i, j)`.
    pub fn cell_bounds(&self, i: usize, j: usize) -> RectDomain {
        let min = self.domain.min_corner();
        let c = self.cell_size();
        // Non-negative size by construction.
        RectDomain::from_corners(
            Vec2::new(min.x + i as f32 * c.x, min.y + j as f32 * c.y),
            Vec2::new(min.x + (i + 1) as f32 * c.x, min.y + (j + 1) as f32 * c.y),
        )
        .unwrap_or(*self.domain())
    }
}

/// A grid owning one `T` per cell.
///
/// Cells not explicitly written hold the grid's default value, which is also
/// what [`sub_region`](DataGrid::sub_region) reports for cells outside the
/// grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DataGrid<T> {
    grid: AbstractGrid,
    default: T,
    data: Array2<T>,
}

impl<T: GridElement> DataGrid<T> {
    /// A grid filled with zero; zero is also the default value.
    pub fn new(grid: AbstractGrid) -> Self {
        Self::with_default(grid, T::ZERO)
    }

    /// A grid filled with, and defaulting to, `default`.
    pub fn with_default(grid: AbstractGrid, default: T) -> Self {
        Self {
            data: Array2::filled(grid.nx(), grid.ny(), default),
            grid,
            default,
        }
    }

    /// Wrap an i-major cell buffer.
    ///
    /// # Errors
    ///
    /// [`GridError::ShapeMismatch`] if the buffer length is not `nx · ny`.
    pub fn from_cells(grid: AbstractGrid, cells: Vec<T>) -> Result<Self, GridError> {
        Ok(Self {
            data: Array2::from_vec(grid.nx(), grid.ny(), cells)?,
            grid,
            default: T::ZERO,
        })
    }

    /// Builder-style override of the default value; stored cells are kept.
    pub fn with_default_value(mut self, default: T) -> Self {
        self.default = default;
        self
    }

    /// Geometry of this grid.
    pub fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    /// Domain of this grid.
    pub fn domain(&self) -> &RectDomain {
        self.grid.domain()
    }

    /// Resolution `(nx, ny)`.
    pub fn resolution(&self) -> (usize, usize) {
        self.grid.resolution()
    }

    /// The default value.
    pub fn default_value(&self) -> T {
        self.default
    }

    /// The dense cell array.
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// The dense cell array, mutably.
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Flat i-major cells.
    pub fn cells(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Flat i-major cells, mutably.
    pub fn cells_mut(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }

    /// Value of cell `(i, j)`, or `None` out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        self.data.get(i, j)
    }

    /// Overwrite cell `(i, j)`; out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data.set(i, j, value);
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Reset every cell to the default value.
    pub fn reset(&mut self) {
        self.data.fill(self.default);
    }

    /// Copy the half-open index window `[imin, imax)`.
    ///
    /// The result always has shape `imax - imin` (zero on an axis where
    /// `imax <= imin`). Cells of the window that fall outside the grid take
    /// the default value, including when the window is wholly outside.
    pub fn sub_region(&self, imin: (i64, i64), imax: (i64, i64)) -> Array2<T> {
        let w = (imax.0 - imin.0).max(0) as usize;
        let h = (imax.1 - imin.1).max(0) as usize;
        let mut out = Array2::filled(w, h, self.default);
        let (nx, ny) = (self.grid.nx() as i64, self.grid.ny() as i64);

        let i_lo = imin.0.max(0);
        let i_hi = imax.0.min(nx);
        let j_lo = imin.1.max(0);
        let j_hi = imax.1.min(ny);
        for gi in i_lo..i_hi {
            for gj in j_lo..j_hi {
                *out.at_mut((gi - imin.0) as usize, (gj - imin.1) as usize) =
                    self.data.at(gi as usize, gj as usize);
            }
        }
        out
    }

    /// Smallest and largest cell values, ignoring NaN. `None` when every
    /// cell is NaN.
    pub fn min_max(&self) -> Option<(T, T)> {
        let mut iter = self.cells().iter().copied().filter(|v| v == v);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| {
            (
                if v < lo { v } else { lo },
                if v > hi { v } else { hi },
            )
        }))
    }

    /// Sum of all cells, accumulated in `f64`.
    pub fn sum(&self) -> f64 {
        self.cells().iter().map(|v| v.to_f64()).sum()
    }

    /// Apply `f` cell-wise into a grid of another element type.
    pub fn map<U: GridElement>(&self, f: impl Fn(T) -> U) -> DataGrid<U> {
        DataGrid {
            grid: self.grid,
            default: f(self.default),
            data: Array2::from_vec(
                self.grid.nx(),
                self.grid.ny(),
                self.cells().iter().map(|&v| f(v)).collect(),
            )
            .unwrap_or_else(|_| Array2::filled(self.grid.nx(), self.grid.ny(), U::ZERO)),
        }
    }
}
