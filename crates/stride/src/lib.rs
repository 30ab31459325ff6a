//! Stride: crowd-trajectory analysis.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Stride sub-crates. For most users, adding `stride` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::io::Cursor;
//! use stride::prelude::*;
//!
//! // One agent walking along y = 5.
//! let frames = (0..4)
//!     .map(|t| Frame::from_positions([Vec2::new(2.0 + t as f32, 5.0)]))
//!     .collect();
//! let source = MemoryTrajectory::new(frames).with_step_size(0.1);
//!
//! // Gaussian density on a 20×20 grid of half-metre cells.
//! let domain = RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0))?;
//! let grid = AbstractGrid::new(domain, 20, 20)?;
//! let kernel = Kernel::builder(KernelKind::Gaussian)
//!     .sigma(0.5)
//!     .cell_size(0.5)
//!     .build()?;
//! let density = KernelDensity::new(grid, kernel);
//!
//! // Rasterize every frame on two threads into an in-memory grid file.
//! let writer = GfsWriter::new(Cursor::new(Vec::new()), grid)?;
//! let (bytes, _) = run_pipeline(SourceFeed::new(source), &density, writer, 2)?;
//!
//! let mut reader = GfsReader::open(Cursor::new(bytes.into_inner()))?;
//! assert_eq!(reader.len(), 4);
//! if let Some((first, index)) = reader.next_frame::<f32>()? {
//!     assert_eq!(index, 0);
//!     assert!((first.sum() - 1.0).abs() < 0.02);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stride-core` | Geometry, frames, trajectory and obstacle contracts |
//! | [`grid`] | `stride-grid` | Domains, grids, named region sets |
//! | [`kernel`] | `stride-kernel` | Signals, kernel families, convolution |
//! | [`voronoi`] | `stride-voronoi` | Obstacle-aware Voronoi rasters |
//! | [`gfs`] | `stride-gfs` | Grid file sequences and the rasterization pipeline |
//! | [`analysis`] | `stride-analysis` | Speed and region analyses, project files, task runner |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Geometry, agent frames, and the source contracts (`stride-core`).
///
/// Implement [`types::TrajectorySource`] to feed recorded crowds from any
/// file format, and [`types::ObstacleQuery`] for custom obstacle indexes.
pub use stride_core as types;

/// Domains, grids, and named region sets (`stride-grid`).
pub use stride_grid as grid;

/// Signals, kernel families, and convolution (`stride-kernel`).
///
/// Build kernels with [`kernel::Kernel::builder`].
pub use stride_kernel as kernel;

/// Obstacle-aware Voronoi owner and density rasters (`stride-voronoi`).
pub use stride_voronoi as voronoi;

/// Grid file sequences and the producer/sink pipeline (`stride-gfs`).
///
/// [`gfs::run_to_file`] is the usual entry point; [`gfs::GfsReader`] reads
/// results back.
pub use stride_gfs as gfs;

/// Speed, flow, population, and fundamental-diagram analyses, the project
/// file, and the task runner (`stride-analysis`).
pub use stride_analysis as analysis;

/// Common imports for typical Stride usage.
///
/// ```rust
/// use stride::prelude::*;
/// ```
pub mod prelude {
    // Core types and contracts
    pub use stride_core::{
        AgentRecord, Frame, GridElement, MemoryTrajectory, ObstacleQuery, ObstacleSet, Segment,
        TrajectorySource, Vec2,
    };

    // Grids
    pub use stride_grid::{AbstractGrid, DataGrid, LineSet, RectDomain, RectDomainSet};

    // Kernels
    pub use stride_kernel::{ImpulseSignal, Kernel, KernelKind, Signal};

    // Voronoi
    pub use stride_voronoi::Voronoi;

    // Grid files and pipeline
    pub use stride_gfs::{
        run_pipeline, run_to_file, FrameFeed, FrameWindow, GfsReader, GfsWriter, KernelDensity,
        PipelineConfig, Rasterizer, SourceFeed, VoronoiDensity, VoronoiOwners,
    };

    // Analyses
    pub use stride_analysis::{
        flow_series, fundamental_diagram_series, population_series, Project, SpeedMode,
        SpeedRasterizer, TaskRunner, TimeSeries,
    };

    // Errors
    pub use stride_analysis::{AnalysisError, TaskConfigError};
    pub use stride_core::TrajectoryError;
    pub use stride_gfs::{GfsError, PipelineError};
    pub use stride_grid::GridError;
    pub use stride_kernel::KernelError;
    pub use stride_voronoi::VoronoiError;
}
