//! Error types for domain and grid construction.

use std::fmt;

/// Errors arising from domain, grid, or region-set construction.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// A domain has a negative or non-finite extent.
    InvalidDomain {
        /// What went wrong.
        reason: String,
    },
    /// A grid resolution or cell size is not positive.
    InvalidResolution {
        /// What went wrong.
        reason: String,
    },
    /// A cell buffer does not match the grid resolution.
    ShapeMismatch {
        /// Expected `(nx, ny)`.
        expected: (usize, usize),
        /// Number of cells supplied.
        cells: usize,
    },
    /// Region-set text could not be parsed.
    Parse {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { reason } => write!(f, "invalid domain: {reason}"),
            Self::InvalidResolution { reason } => write!(f, "invalid resolution: {reason}"),
            Self::ShapeMismatch { expected, cells } => write!(
                f,
                "expected {}x{} = {} cells, got {cells}",
                expected.0,
                expected.1,
                expected.0 * expected.1
            ),
            Self::Parse { reason } => write!(f, "region set parse error: {reason}"),
        }
    }
}

impl std::error::Error for GridError {}
