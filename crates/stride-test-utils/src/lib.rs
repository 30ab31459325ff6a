//! Test utilities for Stride development.
//!
//! Provides deterministic trajectory fixtures (walkers, circling agents,
//! line crossers, seeded random walkers), obstacle fixtures, and a scratch
//! path helper for tests that touch the filesystem.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub use fixtures::{
    box_walls, circling_agents, line_crossers, random_walkers, straight_walkers,
};

/// A fresh path under the system temp directory, unique per call.
///
/// Nothing is created; callers remove the file when done.
pub fn scratch_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "stride_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_paths_differ() {
        let a = scratch_path("x.gfs");
        let b = scratch_path("x.gfs");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("x.gfs"));
    }
}
