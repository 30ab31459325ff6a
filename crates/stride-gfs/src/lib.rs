//! Grid file sequences: a binary container for per-frame grids, and the
//! multi-threaded pipeline that fills one from a trajectory.
//!
//! # File layout
//!
//! All values are little-endian.
//!
//! | Offset | Bytes | Field |
//! |---|---|---|
//! | 0 | 8 | minimum corner `x, y` (`f32 × 2`) |
//! | 8 | 8 | size `w, h` (`f32 × 2`) |
//! | 16 | 8 | resolution `nx, ny` (`i32 × 2`) |
//! | 24 | 4 | element type id (`i32`) |
//! | 28 | 4 | frame count (`i32`, patched on finish) |
//! | 32 | `2·size(T)` | global minimum, maximum (`T`, patched on finish) |
//!
//! Frames follow the header back to back, each `nx · ny · size(T)` bytes in
//! i-major order (cell `(i, j)` at position `i · ny + j`).
//!
//! # Pipeline
//!
//! [`run_pipeline`] pulls items from a [`FrameFeed`] under a single lock,
//! rasterizes them on N named producer threads through a [`Rasterizer`],
//! and hands the grids to one sink thread that writes them in feed order
//! and finally patches the header with the frame count and global range.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod any;
pub mod codec;
pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod raster;
pub mod reader;
pub mod stats;
pub mod writer;

pub use any::AnyGrid;
pub use codec::{header_size, GfsHeader, COUNT_OFFSET, FIXED_HEADER_LEN};
pub use config::{PipelineConfig, THREAD_COUNT_ENV};
pub use error::{GfsError, PipelineError};
pub use feed::{FrameFeed, FramePair, FrameWindow, SourceFeed};
pub use pipeline::{run_pipeline, run_to_file, PipelineReport};
pub use raster::{KernelDensity, RasterError, Rasterizer, VoronoiDensity, VoronoiOwners};
pub use reader::GfsReader;
pub use stats::GridStats;
pub use writer::GfsWriter;
