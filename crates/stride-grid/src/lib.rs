//! Rectangular analysis domains, uniform cell grids, and named region sets.
//!
//! - [`RectDomain`] is an axis-aligned world rectangle.
//! - [`AbstractGrid`] tessellates a domain into `nx × ny` cells and maps
//!   between world positions and cell indices.
//! - [`DataGrid`] owns one value per cell.
//! - [`RectDomainSet`] and [`LineSet`] are the named region lists consumed by
//!   population, fundamental-diagram, and flow analyses.
//!
//! Cell `(i, j)` is column `i` along x and row `j` along y. Dense storage is
//! i-major: the flat index of `(i, j)` is `i * ny + j`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod domain;
pub mod error;
pub mod grid;
pub mod regions;

pub use array::Array2;
pub use domain::RectDomain;
pub use error::GridError;
pub use grid::{AbstractGrid, CellIndex, DataGrid};
pub use regions::{LineSet, RectDomainSet};
