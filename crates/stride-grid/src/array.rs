//! A dense, i-major 2D array without world geometry.

use crate::error::GridError;

/// Dense `nx × ny` array; element `(i, j)` lives at `i * ny + j`.
///
/// Used for grid storage, padded convolution windows, and sub-region
/// extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    nx: usize,
    ny: usize,
    cells: Vec<T>,
}

impl<T: Copy> Array2<T> {
    /// An array of shape `(nx, ny)` filled with `value`.
    pub fn filled(nx: usize, ny: usize, value: T) -> Self {
        Self {
            nx,
            ny,
            cells: vec![value; nx * ny],
        }
    }

    /// Wrap an existing i-major buffer.
    ///
    /// # Errors
    ///
    /// [`GridError::ShapeMismatch`] if `cells.len() != nx * ny`.
    pub fn from_vec(nx: usize, ny: usize, cells: Vec<T>) -> Result<Self, GridError> {
        if cells.len() != nx * ny {
            return Err(GridError::ShapeMismatch {
                expected: (nx, ny),
                cells: cells.len(),
            });
        }
        Ok(Self { nx, ny, cells })
    }

    /// Shape `(nx, ny)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Extent along x.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Extent along y.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Flat index of `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        i * self.ny + j
    }

    /// Value at `(i, j)`, or `None` out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        (i < self.nx && j < self.ny).then(|| self.cells[i * self.ny + j])
    }

    /// Value at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of range.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        self.cells[self.index(i, j)]
    }

    /// Mutable reference to `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of range.
    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut T {
        let idx = self.index(i, j);
        &mut self.cells[idx]
    }

    /// Overwrite `(i, j)`; out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        if i < self.nx && j < self.ny {
            self.cells[i * self.ny + j] = value;
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// The flat i-major buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// The flat i-major buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Consume and return the flat buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }
}
