//! Error types for Voronoi rasterization.

use std::fmt;

/// Errors raised by [`Voronoi`](crate::Voronoi).
#[derive(Clone, Debug, PartialEq)]
pub enum VoronoiError {
    /// The radius cap is zero, negative, or NaN.
    InvalidRadius {
        /// The rejected radius.
        radius: f32,
    },
    /// More sites than an `i32` owner id can index.
    TooManySites {
        /// Number of sites supplied.
        count: usize,
    },
}

impl fmt::Display for VoronoiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRadius { radius } => {
                write!(f, "voronoi radius must be positive, got {radius}")
            }
            Self::TooManySites { count } => {
                write!(f, "{count} sites exceed the i32 owner id range")
            }
        }
    }
}

impl std::error::Error for VoronoiError {}
