//! End-to-end pipeline runs: ordering across thread counts, density
//! rasterizers, windows, and the overwrite switch.

use std::fs;

use stride_core::{TrajectorySource, Vec2};
use stride_gfs::{
    run_to_file, FramePair, FrameWindow, GfsReader, KernelDensity, PipelineConfig, RasterError,
    Rasterizer, SourceFeed, VoronoiDensity, VoronoiOwners,
};
use stride_grid::{AbstractGrid, DataGrid, RectDomain};
use stride_kernel::{Kernel, KernelKind};
use stride_test_utils::{random_walkers, scratch_path, straight_walkers};
use stride_voronoi::Voronoi;

fn domain() -> RectDomain {
    RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap()
}

/// Writes the first agent's x coordinate into every cell, so the frame a
/// grid came from can be recovered after the run.
struct StampX {
    grid: AbstractGrid,
}

impl Rasterizer for StampX {
    type Input = stride_core::Frame;
    type Elem = f64;

    fn name(&self) -> &str {
        "stamp-x"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, frame: &stride_core::Frame) -> Result<DataGrid<f64>, RasterError> {
        let x = frame
            .get(0)
            .map(|r| f64::from(r.position.x))
            .ok_or_else(|| RasterError::new("empty frame"))?;
        let mut g = DataGrid::new(self.grid);
        g.fill(x);
        Ok(g)
    }
}

#[test]
fn frames_come_out_in_order_for_any_thread_count() {
    let grid = AbstractGrid::new(domain(), 5, 5).unwrap();
    for threads in [1, 2, 4] {
        let path = scratch_path(&format!("order_{threads}.gfs"));
        let source = straight_walkers(1, 40, Vec2::new(1.0, 0.0), 0.25);
        let config = PipelineConfig::default().with_thread_count(threads);
        let report = run_to_file(SourceFeed::new(source), &StampX { grid }, &path, &config).unwrap();
        assert_eq!(report.frames, 40);
        assert_eq!(report.threads, threads);
        assert_eq!(report.range, Some((1.0, 1.0 + 39.0 * 0.25)));

        let mut reader = GfsReader::open_path(&path).unwrap();
        let mut expected = 0;
        while let Some((g, index)) = reader.next_frame::<f64>().unwrap() {
            assert_eq!(index, expected);
            assert_eq!(g.get(2, 2), Some(1.0 + index as f64 * 0.25));
            expected += 1;
        }
        assert_eq!(expected, 40);
        fs::remove_file(&path).unwrap();
    }
}

#[test]
fn kernel_density_file_conserves_agents() {
    let grid = AbstractGrid::new(domain(), 40, 40).unwrap();
    let kernel = Kernel::builder(KernelKind::Biweight)
        .sigma(1.0)
        .cell_size(0.25)
        .build()
        .unwrap();
    let inner = RectDomain::new(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0)).unwrap();
    let source = random_walkers(11, 6, 12, &inner, 0.2);
    let path = scratch_path("kde.gfs");
    let config = PipelineConfig::default().with_thread_count(3);
    run_to_file(SourceFeed::new(source), &KernelDensity::new(grid, kernel), &path, &config).unwrap();

    let mut reader = GfsReader::open_path(&path).unwrap();
    assert_eq!(reader.len(), 12);
    while let Some((g, index)) = reader.next_frame::<f32>().unwrap() {
        assert!((g.sum() - 6.0).abs() < 1e-2, "frame {index} mass {}", g.sum());
    }
    fs::remove_file(&path).unwrap();
}

#[test]
fn voronoi_files_hold_owners_and_densities() {
    let grid = AbstractGrid::new(domain(), 10, 10).unwrap();
    let source = random_walkers(5, 4, 5, &domain(), 0.5);
    let voronoi = Voronoi::new(f32::INFINITY).unwrap();
    let config = PipelineConfig::default().with_thread_count(2);

    let owners_path = scratch_path("owners.gfs");
    let report = run_to_file(
        SourceFeed::new(source.clone()),
        &VoronoiOwners::new(grid, voronoi.clone()),
        &owners_path,
        &config,
    )
    .unwrap();
    let (lo, hi) = report.range.unwrap();
    assert!(lo >= 0.0 && hi <= 3.0);
    let mut owners = GfsReader::open_path(&owners_path).unwrap();
    while let Some((g, _)) = owners.next_frame::<i32>().unwrap() {
        assert!(g.cells().iter().all(|&o| (0..4).contains(&o)));
    }

    let density_path = scratch_path("voronoi.gfs");
    run_to_file(
        SourceFeed::new(source),
        &VoronoiDensity::new(grid, voronoi),
        &density_path,
        &config,
    )
    .unwrap();
    let mut density = GfsReader::open_path(&density_path).unwrap();
    while let Some((g, _)) = density.next_frame::<f32>().unwrap() {
        let occupied = g.sum();
        assert!(occupied > 0.5 && occupied < 4.0 + 1e-4);
        assert!((occupied - occupied.round()).abs() < 1e-4);
    }
    fs::remove_file(&owners_path).unwrap();
    fs::remove_file(&density_path).unwrap();
}

#[test]
fn existing_file_is_kept_without_overwrite() {
    let grid = AbstractGrid::new(domain(), 2, 2).unwrap();
    let path = scratch_path("keep.gfs");
    let first = straight_walkers(1, 3, Vec2::new(1.0, 0.0), 1.0);
    run_to_file(SourceFeed::new(first), &StampX { grid }, &path, &PipelineConfig::default()).unwrap();

    let second = straight_walkers(1, 9, Vec2::new(1.0, 0.0), 1.0);
    let keep = PipelineConfig::default().with_overwrite(false);
    let report = run_to_file(SourceFeed::new(second.clone()), &StampX { grid }, &path, &keep).unwrap();
    assert!(report.skipped);
    assert_eq!(report.frames, 3);
    assert_eq!(GfsReader::open_path(&path).unwrap().len(), 3);

    let report = run_to_file(SourceFeed::new(second), &StampX { grid }, &path, &PipelineConfig::default()).unwrap();
    assert!(!report.skipped);
    assert_eq!(GfsReader::open_path(&path).unwrap().len(), 9);
    fs::remove_file(&path).unwrap();
}

/// Fails on every frame whose first agent is past `limit`.
struct FailPast {
    grid: AbstractGrid,
    limit: f32,
}

impl Rasterizer for FailPast {
    type Input = stride_core::Frame;
    type Elem = f64;

    fn name(&self) -> &str {
        "fail-past"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, frame: &stride_core::Frame) -> Result<DataGrid<f64>, RasterError> {
        match frame.get(0) {
            Some(r) if r.position.x <= self.limit => Ok(DataGrid::new(self.grid)),
            _ => Err(RasterError::new("past the limit")),
        }
    }
}

#[test]
fn failed_run_is_not_kept_as_a_finished_file() {
    let grid = AbstractGrid::new(domain(), 2, 2).unwrap();
    let path = scratch_path("failed_then_kept.gfs");
    let keep = PipelineConfig::default()
        .with_thread_count(1)
        .with_overwrite(false);

    let source = straight_walkers(1, 9, Vec2::new(1.0, 0.0), 1.0);
    let failing = FailPast { grid, limit: 5.5 };
    assert!(run_to_file(SourceFeed::new(source.clone()), &failing, &path, &keep).is_err());
    assert!(GfsReader::open_path(&path).is_err());

    let report = run_to_file(SourceFeed::new(source), &StampX { grid }, &path, &keep).unwrap();
    assert!(!report.skipped);
    assert_eq!(report.frames, 9);
    assert_eq!(GfsReader::open_path(&path).unwrap().len(), 9);
    fs::remove_file(&path).unwrap();
}

#[test]
fn unreadable_existing_file_is_regenerated() {
    let grid = AbstractGrid::new(domain(), 2, 2).unwrap();
    let path = scratch_path("unreadable.gfs");
    fs::write(&path, b"not a grid file").unwrap();

    let keep = PipelineConfig::default().with_overwrite(false);
    let source = straight_walkers(1, 4, Vec2::new(1.0, 0.0), 1.0);
    let report = run_to_file(SourceFeed::new(source), &StampX { grid }, &path, &keep).unwrap();
    assert!(!report.skipped);
    assert_eq!(GfsReader::open_path(&path).unwrap().len(), 4);
    fs::remove_file(&path).unwrap();
}

/// Displacement of the first agent over the window.
struct Step {
    grid: AbstractGrid,
}

impl Rasterizer for Step {
    type Input = FramePair;
    type Elem = f32;

    fn name(&self) -> &str {
        "step"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, pair: &FramePair) -> Result<DataGrid<f32>, RasterError> {
        let (a, b) = match (pair.earlier.get(0), pair.later.get(0)) {
            (Some(a), Some(b)) => (a.position, b.position),
            _ => return Err(RasterError::new("no agent")),
        };
        let mut g = DataGrid::new(self.grid);
        g.fill(a.distance(b));
        Ok(g)
    }
}

#[test]
fn windowed_feed_starts_after_the_span() {
    let grid = AbstractGrid::new(domain(), 2, 2).unwrap();
    let source = straight_walkers(1, 10, Vec2::new(2.0, 0.0), 0.5);
    assert_eq!(source.agent_count(), 1);
    let path = scratch_path("window.gfs");
    let report = run_to_file(
        FrameWindow::new(source, 3),
        &Step { grid },
        &path,
        &PipelineConfig::default().with_thread_count(2),
    )
    .unwrap();
    assert_eq!(report.frames, 7);
    assert_eq!(report.range, Some((3.0, 3.0)));
    fs::remove_file(&path).unwrap();
}
