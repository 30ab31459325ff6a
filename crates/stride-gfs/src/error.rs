//! Error types for grid files and the rasterization pipeline.

use std::error::Error;
use std::fmt;
use std::io;

use stride_core::{ElementType, TrajectoryError};

/// Errors raised while encoding or decoding a grid file sequence.
#[derive(Debug)]
pub enum GfsError {
    /// An I/O error occurred during read, write, or seek.
    Io(io::Error),
    /// The header holds an unknown element type or an impossible geometry.
    BadHeader {
        /// Human-readable description of what went wrong.
        reason: String,
    },
    /// The stream ended inside the header or a frame.
    TruncatedStream {
        /// What was being read when the stream ended.
        detail: String,
    },
    /// The header was never patched: frame count is zero but frame data
    /// follows. The writer did not finish.
    Unfinalized,
    /// A frame was requested as a different element type than the file
    /// stores.
    ElementMismatch {
        /// Element type recorded in the file.
        stored: ElementType,
        /// Element type requested by the caller.
        requested: ElementType,
    },
    /// A grid's resolution differs from the file's.
    ShapeMismatch {
        /// Resolution of the file.
        expected: (usize, usize),
        /// Resolution of the offending grid.
        found: (usize, usize),
    },
    /// Seek past the last frame.
    FrameOutOfRange {
        /// Requested frame.
        index: usize,
        /// Frames in the file.
        count: usize,
    },
    /// More frames than the `i32` count field can record.
    FrameCountOverflow {
        /// Frames written.
        count: usize,
    },
}

impl fmt::Display for GfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::BadHeader { reason } => write!(f, "bad grid file header: {reason}"),
            Self::TruncatedStream { detail } => write!(f, "truncated grid file: {detail}"),
            Self::Unfinalized => {
                write!(f, "grid file header was never finalized (frame count is zero)")
            }
            Self::ElementMismatch { stored, requested } => {
                write!(f, "file stores {stored} cells, {requested} requested")
            }
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "grid is {}x{}, file expects {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            Self::FrameOutOfRange { index, count } => {
                write!(f, "frame {index} out of range (file has {count} frames)")
            }
            Self::FrameCountOverflow { count } => {
                write!(f, "{count} frames exceed the i32 frame count field")
            }
        }
    }
}

impl Error for GfsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GfsError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors that stop a rasterization pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Writing the output failed.
    Gfs(GfsError),
    /// The trajectory feed failed.
    Trajectory(TrajectoryError),
    /// A producer could not rasterize a frame.
    Raster {
        /// Absolute index of the frame being rasterized.
        frame_index: usize,
        /// What went wrong.
        reason: String,
    },
    /// A producer or sink thread could not be spawned.
    ThreadSpawn {
        /// Description of which thread failed.
        reason: String,
    },
    /// A producer thread panicked.
    ProducerPanicked,
    /// The sink thread panicked.
    SinkPanicked,
    /// The sink finished with a gap in the frame sequence.
    MissingFrame {
        /// First sequence number never received.
        ticket: usize,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gfs(e) => write!(f, "grid file: {e}"),
            Self::Trajectory(e) => write!(f, "trajectory: {e}"),
            Self::Raster {
                frame_index,
                reason,
            } => write!(f, "rasterizing frame {frame_index} failed: {reason}"),
            Self::ThreadSpawn { reason } => write!(f, "thread spawn failed: {reason}"),
            Self::ProducerPanicked => write!(f, "a producer thread panicked"),
            Self::SinkPanicked => write!(f, "the sink thread panicked"),
            Self::MissingFrame { ticket } => {
                write!(f, "frame sequence ended with item {ticket} missing")
            }
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gfs(e) => Some(e),
            Self::Trajectory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GfsError> for PipelineError {
    fn from(e: GfsError) -> Self {
        Self::Gfs(e)
    }
}

impl From<TrajectoryError> for PipelineError {
    fn from(e: TrajectoryError) -> Self {
        Self::Trajectory(e)
    }
}

impl From<io::Error> for PipelineError {
    fn from(e: io::Error) -> Self {
        Self::Gfs(GfsError::Io(e))
    }
}
