//! Lap progress around a centre point.
//!
//! Progress is the counter-clockwise fraction of a full turn an agent has
//! completed since it was first seen. It only grows, except when the agent
//! passes its starting ray again, where it drops back to zero for the next
//! lap. The state lives in [`ProgressFeed`], which the pipeline drains
//! sequentially, so [`ProgressRasterizer`] stays stateless.

use std::f32::consts::TAU;

use stride_core::{TrajectoryError, TrajectorySource, Vec2};
use stride_gfs::{FrameFeed, RasterError, Rasterizer};
use stride_grid::{AbstractGrid, DataGrid};

use crate::blit::blit;

/// Positions and progress of every agent at one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Agent positions.
    pub positions: Vec<Vec2>,
    /// Progress per agent in `[0, 1)`.
    pub progress: Vec<f32>,
}

#[derive(Clone, Copy, Debug)]
struct Lap {
    start: Vec2,
    last: Vec2,
    last_fraction: f32,
    progress: f32,
}

/// Feeds [`ProgressSnapshot`]s over a trajectory, tracking each agent's lap.
#[derive(Debug)]
pub struct ProgressFeed<S> {
    source: S,
    center: Vec2,
    laps: Vec<Option<Lap>>,
}

impl<S: TrajectorySource> ProgressFeed<S> {
    /// Track progress around the origin.
    pub fn new(source: S) -> Self {
        Self {
            source,
            center: Vec2::ZERO,
            laps: Vec::new(),
        }
    }

    /// Track progress around `center`.
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    fn advance(&mut self, k: usize, p: Vec2) -> f32 {
        if self.laps.len() <= k {
            self.laps.resize(k + 1, None);
        }
        let Some(dir) = (p - self.center).normalized() else {
            return self.laps[k].map_or(0.0, |lap| lap.progress);
        };
        let lap = match self.laps[k] {
            None => {
                self.laps[k] = Some(Lap {
                    start: dir,
                    last: dir,
                    last_fraction: 0.0,
                    progress: 0.0,
                });
                return 0.0;
            }
            Some(lap) => lap,
        };

        let mut turned = lap.start.cross(dir).atan2(lap.start.dot(dir));
        if turned < 0.0 {
            turned += TAU;
        }
        let fraction = (turned / TAU).min(1.0 - f32::EPSILON);
        let step = lap.last.cross(dir);

        let progress = if step > 0.0 && fraction < lap.last_fraction {
            // Counter-clockwise step onto a smaller fraction: the start ray
            // was crossed.
            0.0
        } else if step > 0.0 {
            lap.progress.max(fraction)
        } else {
            lap.progress
        };
        self.laps[k] = Some(Lap {
            start: lap.start,
            last: dir,
            last_fraction: fraction,
            progress,
        });
        progress
    }
}

impl<S: TrajectorySource> FrameFeed for ProgressFeed<S> {
    type Item = ProgressSnapshot;

    fn next_item(&mut self) -> Result<Option<(ProgressSnapshot, usize)>, TrajectoryError> {
        let Some((frame, index)) = self.source.next_frame()? else {
            return Ok(None);
        };
        let positions: Vec<Vec2> = frame.positions().collect();
        let progress = positions
            .iter()
            .enumerate()
            .map(|(k, &p)| self.advance(k, p))
            .collect();
        Ok(Some((
            ProgressSnapshot {
                positions,
                progress,
            },
            index,
        )))
    }
}

/// Blits each agent's progress at its cell.
#[derive(Clone, Debug)]
pub struct ProgressRasterizer {
    grid: AbstractGrid,
    blit_radius: usize,
}

impl ProgressRasterizer {
    /// Progress on `grid`, one cell per agent.
    pub fn new(grid: AbstractGrid) -> Self {
        Self {
            grid,
            blit_radius: 0,
        }
    }

    /// Half-width of the blit block in cells.
    pub fn with_blit_radius(mut self, radius: usize) -> Self {
        self.blit_radius = radius;
        self
    }
}

impl Rasterizer for ProgressRasterizer {
    type Input = ProgressSnapshot;
    type Elem = f32;

    fn name(&self) -> &str {
        "progress"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, snapshot: &ProgressSnapshot) -> Result<DataGrid<f32>, RasterError> {
        let mut out = DataGrid::new(self.grid);
        for (&p, &v) in snapshot.positions.iter().zip(&snapshot.progress) {
            blit(&mut out, p, self.blit_radius, v);
        }
        Ok(out)
    }
}
