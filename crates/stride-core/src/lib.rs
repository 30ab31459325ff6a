//! Core types and traits for the Stride crowd-trajectory analysis engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! fundamental abstractions shared by the rest of the workspace: planar
//! geometry primitives, grid element types, agent frames, the trajectory
//! source contract, and the obstacle query contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod element;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod obstacle;
pub mod trajectory;

pub use element::{ElementType, GridElement};
pub use error::TrajectoryError;
pub use frame::{AgentRecord, Frame, ThirdColumn};
pub use geometry::{Segment, Vec2};
pub use obstacle::{ObstacleQuery, ObstacleSet};
pub use trajectory::{MemoryTrajectory, TrajectorySource};
