//! Aggregate analyses over trajectories, the analysis project file, and
//! the task runner that ties them to grid files and time-series output.
//!
//! Raster analyses ([`SpeedRasterizer`], [`AngularSpeedRasterizer`],
//! [`ProgressRasterizer`]) plug into the `stride-gfs` pipeline. Region
//! analyses ([`flow_series`], [`population_series`],
//! [`fundamental_diagram_series`]) walk a trajectory once and produce a
//! [`TimeSeries`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod angular;
pub mod blit;
pub mod error;
pub mod progress;
pub mod project;
pub mod regions;
pub mod runner;
pub mod speed;
pub mod timeseries;

pub use angular::AngularSpeedRasterizer;
pub use blit::blit;
pub use error::{AnalysisError, TaskConfigError};
pub use progress::{ProgressFeed, ProgressRasterizer, ProgressSnapshot};
pub use project::{
    CommonKeys, DensityMethod, Project, SpeedKind, TaskAction, TaskKind, TaskParams, TaskSpec,
};
pub use regions::{flow_series, fundamental_diagram_series, population_series};
pub use runner::{MemoryEnvironment, TaskEnvironment, TaskOutcome, TaskRunner};
pub use speed::{SpeedBuilder, SpeedMode, SpeedRasterizer};
pub use timeseries::TimeSeries;
