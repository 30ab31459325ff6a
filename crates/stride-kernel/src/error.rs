//! Error types for signal extraction and convolution.

use std::error::Error;
use std::fmt;

use stride_grid::GridError;

/// Errors raised by kernel construction and convolution.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// The kernel cannot consume this signal variant.
    InvalidSignalType {
        /// Kernel family name.
        kernel: &'static str,
        /// Signal variant name.
        signal: &'static str,
    },
    /// The convolution domain is not contained in the signal domain, or the
    /// two grids are not aligned.
    InvalidDomain {
        /// What went wrong.
        reason: String,
    },
    /// The sampled kernel would be wider than the allocation cap.
    KernelTooLarge {
        /// Requested sample width in cells.
        width: usize,
        /// Maximum allowed width.
        cap: usize,
    },
    /// The kernel has no fixed sample table (adaptive kernels sample per
    /// impulse).
    KernelUnset,
    /// A smoothing parameter, cell size, or weight vector is invalid.
    InvalidParameter {
        /// What went wrong.
        reason: String,
    },
    /// Grid construction failed.
    Grid(GridError),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignalType { kernel, signal } => {
                write!(f, "{kernel} kernel cannot convolve a {signal} signal")
            }
            Self::InvalidDomain { reason } => write!(f, "invalid convolution domain: {reason}"),
            Self::KernelTooLarge { width, cap } => {
                write!(f, "kernel width {width} exceeds cap {cap}")
            }
            Self::KernelUnset => write!(f, "kernel has no fixed sample table"),
            Self::InvalidParameter { reason } => write!(f, "invalid kernel parameter: {reason}"),
            Self::Grid(e) => write!(f, "grid error: {e}"),
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for KernelError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}
