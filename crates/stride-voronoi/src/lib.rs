//! Constrained Voronoi rasterization.
//!
//! Each cell of an analysis grid is assigned to the nearest site within a
//! radius cap and, when obstacles are supplied, with an unobstructed line of
//! sight from the site to the cell centre. The result is either an owner
//! grid (site index per cell, `-1` for unclaimed) or a density grid holding
//! `1 / area` of the owning region.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod rasterizer;

pub use error::VoronoiError;
pub use rasterizer::{OwnerMap, Voronoi, UNOWNED};
