//! Error types for analyses, project files, and task execution.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use stride_core::TrajectoryError;
use stride_gfs::{GfsError, PipelineError, RasterError};
use stride_grid::GridError;
use stride_kernel::KernelError;
use stride_voronoi::VoronoiError;

/// Problems found while loading a project file.
///
/// Per-task problems deactivate the task; only [`Malformed`] and
/// [`UnknownTaskType`] reject the whole file.
///
/// [`Malformed`]: TaskConfigError::Malformed
/// [`UnknownTaskType`]: TaskConfigError::UnknownTaskType
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskConfigError {
    /// A required key is absent from a task block.
    MissingKey {
        /// The missing key.
        key: String,
    },
    /// A key's value could not be interpreted.
    InvalidValue {
        /// The offending key.
        key: String,
        /// The raw value.
        value: String,
    },
    /// A referenced file does not exist.
    MissingFile {
        /// The path as written in the project.
        path: PathBuf,
    },
    /// A task block opens with an unrecognized tag.
    UnknownTaskType {
        /// The tag as written.
        tag: String,
    },
    /// A line is neither a comment, a tag, nor a `key || value` pair, or
    /// appears where it cannot belong.
    Malformed {
        /// One-based line number.
        line: usize,
    },
}

impl fmt::Display for TaskConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { key } => write!(f, "missing key '{key}'"),
            Self::InvalidValue { key, value } => write!(f, "invalid value '{value}' for '{key}'"),
            Self::MissingFile { path } => write!(f, "file not found: {}", path.display()),
            Self::UnknownTaskType { tag } => write!(f, "unknown task type '{tag}'"),
            Self::Malformed { line } => write!(f, "malformed project file at line {line}"),
        }
    }
}

impl Error for TaskConfigError {}

/// Errors raised while building or running an analysis.
#[derive(Debug)]
pub enum AnalysisError {
    /// The task configuration is unusable.
    Config(TaskConfigError),
    /// An analysis parameter is out of range.
    InvalidParameter {
        /// What is wrong.
        reason: String,
    },
    /// Kernel construction or convolution failed.
    Kernel(KernelError),
    /// Voronoi construction failed.
    Voronoi(VoronoiError),
    /// Grid geometry is invalid.
    Grid(GridError),
    /// A grid file could not be read or written.
    Gfs(GfsError),
    /// The rasterization pipeline failed.
    Pipeline(PipelineError),
    /// The trajectory source failed.
    Trajectory(TrajectoryError),
    /// Writing a time-series file failed.
    Io(io::Error),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "task configuration: {e}"),
            Self::InvalidParameter { reason } => write!(f, "invalid parameter: {reason}"),
            Self::Kernel(e) => write!(f, "kernel: {e}"),
            Self::Voronoi(e) => write!(f, "voronoi: {e}"),
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::Gfs(e) => write!(f, "grid file: {e}"),
            Self::Pipeline(e) => write!(f, "pipeline: {e}"),
            Self::Trajectory(e) => write!(f, "trajectory: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::InvalidParameter { .. } => None,
            Self::Kernel(e) => Some(e),
            Self::Voronoi(e) => Some(e),
            Self::Grid(e) => Some(e),
            Self::Gfs(e) => Some(e),
            Self::Pipeline(e) => Some(e),
            Self::Trajectory(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<TaskConfigError> for AnalysisError {
    fn from(e: TaskConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<KernelError> for AnalysisError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

impl From<VoronoiError> for AnalysisError {
    fn from(e: VoronoiError) -> Self {
        Self::Voronoi(e)
    }
}

impl From<GridError> for AnalysisError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<GfsError> for AnalysisError {
    fn from(e: GfsError) -> Self {
        Self::Gfs(e)
    }
}

impl From<PipelineError> for AnalysisError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl From<TrajectoryError> for AnalysisError {
    fn from(e: TrajectoryError) -> Self {
        Self::Trajectory(e)
    }
}

impl From<io::Error> for AnalysisError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<AnalysisError> for RasterError {
    fn from(e: AnalysisError) -> Self {
        RasterError::new(e.to_string())
    }
}
