//! Owner and density rasterization.

use std::fmt;
use std::sync::Arc;

use stride_core::{ObstacleQuery, Segment, Vec2};
use stride_grid::{AbstractGrid, DataGrid};

use crate::error::VoronoiError;

/// Owner id of a cell no site claims.
pub const UNOWNED: i32 = -1;

/// Radius-capped Voronoi rasterizer with optional line-of-sight obstacles.
///
/// # Examples
///
/// ```
/// use stride_core::Vec2;
/// use stride_grid::{AbstractGrid, RectDomain};
/// use stride_voronoi::Voronoi;
///
/// let domain = RectDomain::new(Vec2::ZERO, Vec2::new(4.0, 4.0)).unwrap();
/// let grid = AbstractGrid::new(domain, 4, 4).unwrap();
/// let sites = [Vec2::new(0.5, 0.5), Vec2::new(3.5, 3.5)];
///
/// let density = Voronoi::new(100.0).unwrap().density(grid, &sites).unwrap();
/// let total: f64 = density.sum();
/// assert!((total - 2.0).abs() < 1e-6);
/// ```
#[derive(Clone)]
pub struct Voronoi {
    radius: f32,
    obstacles: Option<Arc<dyn ObstacleQuery>>,
}

/// The owner grid of one rasterization and the cell count of each region.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnerMap {
    owners: DataGrid<i32>,
    areas: Vec<usize>,
}

impl OwnerMap {
    /// Site index per cell, [`UNOWNED`] where no site reaches.
    pub fn owners(&self) -> &DataGrid<i32> {
        &self.owners
    }

    /// Consume into the owner grid.
    pub fn into_owners(self) -> DataGrid<i32> {
        self.owners
    }

    /// Number of cells owned by site `k`.
    pub fn area(&self, k: usize) -> usize {
        self.areas.get(k).copied().unwrap_or(0)
    }

    /// Per-site cell counts, indexed by site.
    pub fn areas(&self) -> &[usize] {
        &self.areas
    }

    /// Sites owning at least one cell.
    pub fn occupied(&self) -> usize {
        self.areas.iter().filter(|&&a| a > 0).count()
    }

    /// `1 / area` of the owning region per cell; unowned cells are zero.
    pub fn density(&self) -> DataGrid<f32> {
        self.owners.map(|owner| {
            usize::try_from(owner)
                .ok()
                .and_then(|k| self.areas.get(k))
                .filter(|&&a| a > 0)
                .map_or(0.0, |&a| 1.0 / a as f32)
        })
    }
}

impl Voronoi {
    /// A rasterizer with radius cap `radius` (metres) and no obstacles.
    ///
    /// An infinite radius is allowed and means "no cap".
    ///
    /// # Errors
    ///
    /// [`VoronoiError::InvalidRadius`] for a non-positive or NaN radius.
    pub fn new(radius: f32) -> Result<Self, VoronoiError> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(VoronoiError::InvalidRadius { radius });
        }
        Ok(Self {
            radius,
            obstacles: None,
        })
    }

    /// Restrict ownership to cells visible from the site.
    pub fn with_obstacles(mut self, obstacles: Arc<dyn ObstacleQuery>) -> Self {
        self.obstacles = Some(obstacles);
        self
    }

    /// The radius cap.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Assign every cell of `grid` to its nearest visible site within the
    /// radius cap.
    ///
    /// Sites are visited in slice order and a cell changes hands only on a
    /// strictly smaller distance, so ties go to the earlier site. Sites
    /// outside the grid still compete for cells in reach. Non-finite sites
    /// claim nothing.
    ///
    /// # Errors
    ///
    /// [`VoronoiError::TooManySites`] when the site count exceeds the
    /// `i32` owner range.
    pub fn owners(&self, grid: AbstractGrid, sites: &[Vec2]) -> Result<OwnerMap, VoronoiError> {
        if i32::try_from(sites.len()).is_err() {
            return Err(VoronoiError::TooManySites { count: sites.len() });
        }
        let (nx, ny) = grid.resolution();
        let mut owners = DataGrid::with_default(grid, UNOWNED);
        let mut dist = vec![f32::INFINITY; nx * ny];

        let cell = grid.cell_size();
        let reach_i = reach(self.radius, cell.x);
        let reach_j = reach(self.radius, cell.y);

        for (k, &site) in sites.iter().enumerate() {
            if !site.is_finite() {
                continue;
            }
            let (ci, cj) = grid.cell_of_unclipped(site);
            let i_lo = ci.saturating_sub(reach_i).max(0);
            let i_hi = ci.saturating_add(reach_i).min(nx as i64 - 1);
            let j_lo = cj.saturating_sub(reach_j).max(0);
            let j_hi = cj.saturating_add(reach_j).min(ny as i64 - 1);

            for i in i_lo..=i_hi {
                for j in j_lo..=j_hi {
                    let center = grid.cell_center(i, j);
                    let d = self.visible_distance(site, center);
                    let idx = i as usize * ny + j as usize;
                    if d <= self.radius && d < dist[idx] {
                        dist[idx] = d;
                        owners.set(i as usize, j as usize, k as i32);
                    }
                }
            }
        }

        let mut areas = vec![0usize; sites.len()];
        for &owner in owners.cells() {
            if let Ok(k) = usize::try_from(owner) {
                areas[k] += 1;
            }
        }
        Ok(OwnerMap { owners, areas })
    }

    /// Density variant: `1 / area_k` in every cell owned by site `k`, with
    /// area counted in cells.
    pub fn density(&self, grid: AbstractGrid, sites: &[Vec2]) -> Result<DataGrid<f32>, VoronoiError> {
        Ok(self.owners(grid, sites)?.density())
    }

    fn visible_distance(&self, site: Vec2, center: Vec2) -> f32 {
        if let Some(obstacles) = &self.obstacles {
            if obstacles.intersects(&Segment::new(site, center)) {
                return f32::INFINITY;
            }
        }
        site.distance(center)
    }
}

/// Block half-width `⌈radius / cell⌉`, saturating for huge or infinite radii.
fn reach(radius: f32, cell: f32) -> i64 {
    let cells = (f64::from(radius) / f64::from(cell)).ceil();
    if cells.is_finite() && cells < 1e12 {
        cells as i64
    } else {
        i64::MAX / 4
    }
}

impl fmt::Debug for Voronoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voronoi")
            .field("radius", &self.radius)
            .field("obstacles", &self.obstacles.is_some())
            .finish()
    }
}
