//! Angular speed around a centre point.

use stride_core::Vec2;
use stride_gfs::{FramePair, RasterError, Rasterizer};
use stride_grid::{AbstractGrid, DataGrid};

use crate::blit::blit;
use crate::error::AnalysisError;

/// Signed angular velocity of each agent around `center`, in degrees per
/// second, blitted at the agent's current cell.
///
/// Counter-clockwise motion is positive: the sign follows the cross
/// product of the successive unit radial vectors.
#[derive(Clone, Debug)]
pub struct AngularSpeedRasterizer {
    grid: AbstractGrid,
    center: Vec2,
    step_seconds: f32,
    blit_radius: usize,
}

impl AngularSpeedRasterizer {
    /// Rasterizer around the origin with pairs `step_seconds` apart.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] for a non-positive step.
    pub fn new(grid: AbstractGrid, step_seconds: f32) -> Result<Self, AnalysisError> {
        if !(step_seconds.is_finite() && step_seconds > 0.0) {
            return Err(AnalysisError::InvalidParameter {
                reason: format!("angular step must be positive seconds, got {step_seconds}"),
            });
        }
        Ok(Self {
            grid,
            center: Vec2::ZERO,
            step_seconds,
            blit_radius: 0,
        })
    }

    /// Measure angles around `center` instead of the origin.
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// Half-width of the blit block in cells.
    pub fn with_blit_radius(mut self, radius: usize) -> Self {
        self.blit_radius = radius;
        self
    }

    /// Current position and angular speed (deg/s) of every agent present
    /// in both frames. Agents sitting on the centre are skipped.
    pub fn angular_speeds(&self, pair: &FramePair) -> Vec<(Vec2, f32)> {
        pair.earlier
            .positions()
            .zip(pair.later.positions())
            .filter_map(|(before, now)| {
                let a = (before - self.center).normalized()?;
                let b = (now - self.center).normalized()?;
                let turn = a.cross(b).atan2(a.dot(b)).to_degrees();
                Some((now, turn / self.step_seconds))
            })
            .collect()
    }
}

impl Rasterizer for AngularSpeedRasterizer {
    type Input = FramePair;
    type Elem = f32;

    fn name(&self) -> &str {
        "angular-speed"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, pair: &FramePair) -> Result<DataGrid<f32>, RasterError> {
        let mut out = DataGrid::new(self.grid);
        for (p, w) in self.angular_speeds(pair) {
            blit(&mut out, p, self.blit_radius, w);
        }
        Ok(out)
    }
}
