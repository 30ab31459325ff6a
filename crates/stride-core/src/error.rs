//! Error types shared by trajectory sources.
//!
//! End of sequence is not an error: [`TrajectorySource::next_frame`]
//! signals it with `Ok(None)` and the pipeline treats it as "stop
//! producing".
//!
//! [`TrajectorySource::next_frame`]: crate::TrajectorySource::next_frame

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised while reading or seeking a trajectory source.
#[derive(Debug)]
pub enum TrajectoryError {
    /// `set_next` asked for a frame beyond the end of the source.
    SeekOutOfRange {
        /// Requested frame index.
        index: usize,
        /// Number of frames available.
        len: usize,
    },
    /// A record buffer could not be interpreted as agent records.
    MalformedRecord {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The underlying reader failed.
    Io(io::Error),
}

impl fmt::Display for TrajectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeekOutOfRange { index, len } => {
                write!(f, "frame {index} out of range (source has {len} frames)")
            }
            Self::MalformedRecord { reason } => write!(f, "malformed agent record: {reason}"),
            Self::Io(e) => write!(f, "trajectory I/O error: {e}"),
        }
    }
}

impl Error for TrajectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrajectoryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
