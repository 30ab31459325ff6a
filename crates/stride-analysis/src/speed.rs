//! Per-agent speed rasterization.
//!
//! Speeds come from a [`FramePair`] `span` frames apart:
//! `‖pₜ − pₜ₋w‖ / (w·Δt)`, clamped to a configured maximum. Three
//! renderings are available:
//!
//! - [`SpeedMode::Blit`] writes each agent's speed into a small block
//!   around its cell.
//! - [`SpeedMode::Gaussian`] convolves speed-weighted impulses with a
//!   Gaussian kernel.
//! - [`SpeedMode::Normalized`] divides the speed-weighted convolution by the
//!   unweighted one, giving a locally averaged speed.

use std::fmt;
use std::str::FromStr;

use stride_core::{AgentRecord, Vec2};
use stride_gfs::{FramePair, RasterError, Rasterizer};
use stride_grid::{AbstractGrid, DataGrid};
use stride_kernel::{ImpulseSignal, Kernel, KernelKind, Signal};

use crate::blit::blit;
use crate::error::AnalysisError;

/// Speed clamp used when none is configured, in m/s.
pub const DEFAULT_MAX_SPEED: f32 = 10.0;

/// Contribution below which a normalized cell is reported as zero.
const MIN_CONTRIBUTION: f32 = 1e-9;

/// How agent speeds are drawn onto the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeedMode {
    /// Assign the speed to a cell block around the agent.
    #[default]
    Blit,
    /// Gaussian convolution of speed-weighted impulses.
    Gaussian,
    /// Speed-weighted convolution divided by the agent contribution.
    Normalized,
}

impl SpeedMode {
    /// Name used in project files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Blit => "Blit",
            Self::Gaussian => "Gaussian",
            Self::Normalized => "Normalized",
        }
    }
}

impl fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpeedMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blit" => Ok(Self::Blit),
            "gaussian" => Ok(Self::Gaussian),
            "normalized" => Ok(Self::Normalized),
            other => Err(AnalysisError::InvalidParameter {
                reason: format!("unknown speed mode '{other}'"),
            }),
        }
    }
}

// ── Builder ────────────────────────────────────────────────────────

/// Builder for [`SpeedRasterizer`].
#[derive(Clone, Debug)]
pub struct SpeedBuilder {
    grid: AbstractGrid,
    mode: SpeedMode,
    step_seconds: Option<f32>,
    max_speed: f32,
    blit_radius: usize,
    sigma: Option<f32>,
    reflect: bool,
    excluded_states: Vec<u32>,
}

impl SpeedBuilder {
    /// Rendering mode. Default: [`SpeedMode::Blit`].
    pub fn mode(mut self, mode: SpeedMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seconds between the two frames of each pair (`w·Δt`). Required.
    pub fn step_seconds(mut self, seconds: f32) -> Self {
        self.step_seconds = Some(seconds);
        self
    }

    /// Upper speed clamp in m/s. Default: [`DEFAULT_MAX_SPEED`].
    pub fn max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Half-width of the blit block in cells. Default: 0.
    pub fn blit_radius(mut self, radius: usize) -> Self {
        self.blit_radius = radius;
        self
    }

    /// Gaussian `σ` for the convolution modes.
    pub fn sigma(mut self, sigma: f32) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Reflect impulses at the grid edge in the convolution modes.
    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    /// Skip agents whose state id is listed.
    pub fn exclude_states(mut self, states: impl IntoIterator<Item = u32>) -> Self {
        self.excluded_states.extend(states);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] for a missing or non-positive
    /// step, a non-positive maximum speed, a convolution mode without `σ`,
    /// or a convolution mode on non-square cells;
    /// [`AnalysisError::Kernel`] when the Gaussian cannot be sampled.
    pub fn build(self) -> Result<SpeedRasterizer, AnalysisError> {
        let step_seconds = match self.step_seconds {
            Some(s) if s.is_finite() && s > 0.0 => s,
            other => {
                return Err(AnalysisError::InvalidParameter {
                    reason: format!("speed step must be positive seconds, got {other:?}"),
                })
            }
        };
        if self.max_speed.is_nan() || self.max_speed <= 0.0 {
            return Err(AnalysisError::InvalidParameter {
                reason: format!("max speed must be positive, got {}", self.max_speed),
            });
        }

        let kernel = match self.mode {
            SpeedMode::Blit => None,
            SpeedMode::Gaussian | SpeedMode::Normalized => {
                let sigma = self.sigma.ok_or_else(|| AnalysisError::InvalidParameter {
                    reason: format!("{} speed needs a smoothing parameter", self.mode),
                })?;
                if !self.grid.is_square() {
                    return Err(AnalysisError::InvalidParameter {
                        reason: format!("{} speed needs square cells", self.mode),
                    });
                }
                Some(
                    Kernel::builder(KernelKind::Gaussian)
                        .sigma(sigma)
                        .cell_size(self.grid.cell_size().x)
                        .reflect(self.reflect)
                        .build()?,
                )
            }
        };

        Ok(SpeedRasterizer {
            grid: self.grid,
            mode: self.mode,
            step_seconds,
            max_speed: self.max_speed,
            blit_radius: self.blit_radius,
            kernel,
            excluded_states: self.excluded_states,
        })
    }
}

// ── SpeedRasterizer ────────────────────────────────────────────────

/// Rasterizes agent speeds over frame pairs.
#[derive(Clone, Debug)]
pub struct SpeedRasterizer {
    grid: AbstractGrid,
    mode: SpeedMode,
    step_seconds: f32,
    max_speed: f32,
    blit_radius: usize,
    kernel: Option<Kernel>,
    excluded_states: Vec<u32>,
}

impl SpeedRasterizer {
    /// Start building a speed rasterizer over `grid`.
    pub fn builder(grid: AbstractGrid) -> SpeedBuilder {
        SpeedBuilder {
            grid,
            mode: SpeedMode::Blit,
            step_seconds: None,
            max_speed: DEFAULT_MAX_SPEED,
            blit_radius: 0,
            sigma: None,
            reflect: false,
            excluded_states: Vec::new(),
        }
    }

    /// Rendering mode.
    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Upper speed clamp.
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    fn excluded(&self, record: &AgentRecord) -> bool {
        record
            .state
            .is_some_and(|s| self.excluded_states.contains(&s))
    }

    /// Current position and clamped speed of every agent present in both
    /// frames and not excluded by state.
    pub fn agent_speeds(&self, pair: &FramePair) -> Vec<(Vec2, f32)> {
        pair.earlier
            .records()
            .iter()
            .zip(pair.later.records())
            .filter(|(_, now)| !self.excluded(now))
            .filter_map(|(before, now)| {
                let speed = before.position.distance(now.position) / self.step_seconds;
                speed
                    .is_finite()
                    .then_some((now.position, speed.min(self.max_speed)))
            })
            .collect()
    }

    fn convolve_speeds(
        &self,
        kernel: &Kernel,
        speeds: &[(Vec2, f32)],
        weighted: bool,
    ) -> Result<DataGrid<f32>, RasterError> {
        let points = speeds.iter().map(|&(p, _)| p).collect();
        let mut signal = ImpulseSignal::new(*self.grid.domain(), points);
        if weighted {
            signal = signal.with_weights(speeds.iter().map(|&(_, v)| v).collect())?;
        }
        Ok(kernel.convolve_to_grid(&Signal::from(signal), self.grid)?)
    }
}

impl Rasterizer for SpeedRasterizer {
    type Input = FramePair;
    type Elem = f32;

    fn name(&self) -> &str {
        "speed"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, pair: &FramePair) -> Result<DataGrid<f32>, RasterError> {
        let speeds = self.agent_speeds(pair);
        let kernel = match (&self.kernel, self.mode) {
            (_, SpeedMode::Blit) => {
                let mut out = DataGrid::new(self.grid);
                for &(p, v) in &speeds {
                    blit(&mut out, p, self.blit_radius, v);
                }
                return Ok(out);
            }
            (Some(kernel), _) => kernel,
            (None, mode) => return Err(RasterError::new(format!("{mode} speed has no kernel"))),
        };

        let mut weighted = self.convolve_speeds(kernel, &speeds, true)?;
        if self.mode == SpeedMode::Normalized {
            let contribution = self.convolve_speeds(kernel, &speeds, false)?;
            for (cell, &c) in weighted.cells_mut().iter_mut().zip(contribution.cells()) {
                *cell = if c > MIN_CONTRIBUTION { *cell / c } else { 0.0 };
            }
        }
        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::Frame;
    use stride_grid::RectDomain;

    fn grid(n: usize) -> AbstractGrid {
        let d = RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap();
        AbstractGrid::new(d, n, n).unwrap()
    }

    fn pair(before: &[(f32, f32)], after: &[(f32, f32)]) -> FramePair {
        FramePair {
            earlier: Frame::from_positions(before.iter().copied().map(Vec2::from)),
            later: Frame::from_positions(after.iter().copied().map(Vec2::from)),
            span: 1,
        }
    }

    #[test]
    fn blit_writes_speed_at_agent_cell() {
        let r = SpeedRasterizer::builder(grid(10))
            .step_seconds(0.5)
            .build()
            .unwrap();
        let g = r.rasterize(&pair(&[(2.5, 2.5)], &[(3.5, 2.5)])).unwrap();
        assert_eq!(g.get(3, 2), Some(2.0));
        assert_eq!(g.sum(), 2.0);
    }

    #[test]
    fn speeds_are_clamped_to_the_configured_maximum() {
        let r = SpeedRasterizer::builder(grid(10))
            .step_seconds(0.1)
            .max_speed(1.5)
            .build()
            .unwrap();
        let g = r
            .rasterize(&pair(&[(1.5, 1.5), (5.5, 5.5)], &[(1.5, 1.55), (8.5, 5.5)]))
            .unwrap();
        assert!((g.get(1, 1).unwrap() - 0.5).abs() < 1e-5);
        assert_eq!(g.get(8, 5), Some(1.5));
        let (_, max) = g.min_max().unwrap();
        assert!(max <= 1.5);
    }

    #[test]
    fn excluded_states_are_skipped() {
        let r = SpeedRasterizer::builder(grid(10))
            .step_seconds(1.0)
            .exclude_states([3])
            .build()
            .unwrap();
        let later = Frame::new(vec![
            AgentRecord::at(Vec2::new(1.5, 1.5)).with_state(3),
            AgentRecord::at(Vec2::new(6.5, 6.5)).with_state(1),
        ]);
        let p = FramePair {
            earlier: Frame::from_positions([Vec2::new(0.5, 1.5), Vec2::new(5.5, 6.5)]),
            later,
            span: 1,
        };
        let speeds = r.agent_speeds(&p);
        assert_eq!(speeds.len(), 1);
        assert_eq!(speeds[0].0, Vec2::new(6.5, 6.5));
    }

    #[test]
    fn normalized_mode_recovers_a_uniform_speed() {
        let r = SpeedRasterizer::builder(grid(40))
            .mode(SpeedMode::Normalized)
            .sigma(0.5)
            .step_seconds(1.0)
            .build()
            .unwrap();
        let before = [(3.0, 3.0), (3.5, 4.0), (4.0, 3.2)];
        let after: Vec<(f32, f32)> = before.iter().map(|&(x, y)| (x + 1.2, y)).collect();
        let g = r.rasterize(&pair(&before, &after)).unwrap();
        let near = g.grid().cell_of(Vec2::new(4.6, 3.4));
        let v = g.get(near.0, near.1).unwrap();
        assert!((v - 1.2).abs() < 1e-3, "normalized speed {v}");
        assert_eq!(g.get(39, 39), Some(0.0));
    }

    #[test]
    fn gaussian_mode_carries_speed_as_mass() {
        let r = SpeedRasterizer::builder(grid(40))
            .mode(SpeedMode::Gaussian)
            .sigma(0.5)
            .step_seconds(1.0)
            .build()
            .unwrap();
        let g = r.rasterize(&pair(&[(5.0, 5.0)], &[(5.0, 7.0)])).unwrap();
        assert!((g.sum() - 2.0).abs() < 0.05, "mass {}", g.sum());
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        assert!(SpeedRasterizer::builder(grid(10)).build().is_err());
        assert!(SpeedRasterizer::builder(grid(10))
            .step_seconds(1.0)
            .max_speed(0.0)
            .build()
            .is_err());
        assert!(SpeedRasterizer::builder(grid(10))
            .step_seconds(1.0)
            .mode(SpeedMode::Gaussian)
            .build()
            .is_err());
        assert_eq!("normalized".parse::<SpeedMode>().unwrap(), SpeedMode::Normalized);
    }
}
