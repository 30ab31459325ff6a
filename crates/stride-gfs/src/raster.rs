//! The rasterization seam between feeds and grid files.

use std::error::Error;
use std::fmt;

use stride_core::{Frame, GridElement, Vec2};
use stride_grid::{AbstractGrid, DataGrid, GridError, RectDomain};
use stride_kernel::{ImpulseSignal, Kernel, KernelError, Signal};
use stride_voronoi::{Voronoi, VoronoiError};

/// Turns one feed item into one grid.
///
/// Implementations are shared by reference across producer threads and
/// must not keep per-item state; anything sequential belongs in the feed.
pub trait Rasterizer: Send + Sync {
    /// The feed item this rasterizer consumes.
    type Input: Send;
    /// Cell type of the produced grids.
    type Elem: GridElement;

    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Geometry of every produced grid.
    fn grid(&self) -> &AbstractGrid;

    /// Rasterize one item.
    fn rasterize(&self, input: &Self::Input) -> Result<DataGrid<Self::Elem>, RasterError>;
}

/// A producer-side failure, reported with the frame index by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterError {
    /// What went wrong.
    pub reason: String,
}

impl RasterError {
    /// Error with a free-form reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl Error for RasterError {}

impl From<KernelError> for RasterError {
    fn from(e: KernelError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<VoronoiError> for RasterError {
    fn from(e: VoronoiError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<GridError> for RasterError {
    fn from(e: GridError) -> Self {
        Self::new(e.to_string())
    }
}

// ── KernelDensity ──────────────────────────────────────────────────

/// Kernel density estimate of agent positions.
#[derive(Clone, Debug)]
pub struct KernelDensity {
    grid: AbstractGrid,
    kernel: Kernel,
    signal_domain: RectDomain,
}

impl KernelDensity {
    /// Density on `grid`; agents are taken from the grid's own domain.
    pub fn new(grid: AbstractGrid, kernel: Kernel) -> Self {
        Self {
            signal_domain: *grid.domain(),
            grid,
            kernel,
        }
    }

    /// Take agents from a wider domain, so agents just outside the grid
    /// still contribute.
    pub fn with_signal_domain(mut self, domain: RectDomain) -> Self {
        self.signal_domain = domain;
        self
    }

    /// The kernel in use.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

impl Rasterizer for KernelDensity {
    type Input = Frame;
    type Elem = f32;

    fn name(&self) -> &str {
        "kernel-density"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, frame: &Frame) -> Result<DataGrid<f32>, RasterError> {
        let signal = Signal::from(ImpulseSignal::from_frame(self.signal_domain, frame));
        Ok(self.kernel.convolve_to_grid(&signal, self.grid)?)
    }
}

// ── Voronoi ────────────────────────────────────────────────────────

/// Voronoi density (`1 / area` of each agent's region).
#[derive(Clone, Debug)]
pub struct VoronoiDensity {
    grid: AbstractGrid,
    voronoi: Voronoi,
}

impl VoronoiDensity {
    /// Density on `grid`.
    pub fn new(grid: AbstractGrid, voronoi: Voronoi) -> Self {
        Self { grid, voronoi }
    }
}

impl Rasterizer for VoronoiDensity {
    type Input = Frame;
    type Elem = f32;

    fn name(&self) -> &str {
        "voronoi-density"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, frame: &Frame) -> Result<DataGrid<f32>, RasterError> {
        let sites: Vec<Vec2> = frame.positions().collect();
        Ok(self.voronoi.density(self.grid, &sites)?)
    }
}

/// Voronoi owner ids (agent index per cell, `-1` unowned).
#[derive(Clone, Debug)]
pub struct VoronoiOwners {
    grid: AbstractGrid,
    voronoi: Voronoi,
}

impl VoronoiOwners {
    /// Owner ids on `grid`.
    pub fn new(grid: AbstractGrid, voronoi: Voronoi) -> Self {
        Self { grid, voronoi }
    }
}

impl Rasterizer for VoronoiOwners {
    type Input = Frame;
    type Elem = i32;

    fn name(&self) -> &str {
        "voronoi-owners"
    }

    fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    fn rasterize(&self, frame: &Frame) -> Result<DataGrid<i32>, RasterError> {
        let sites: Vec<Vec2> = frame.positions().collect();
        Ok(self.voronoi.owners(self.grid, &sites)?.into_owners())
    }
}
