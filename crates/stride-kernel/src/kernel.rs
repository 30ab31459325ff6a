//! Sampled smoothing kernels and convolution against signals.

use std::fmt;
use std::sync::Arc;

use stride_core::{ObstacleQuery, Vec2};
use stride_grid::{AbstractGrid, Array2, DataGrid};

use crate::error::KernelError;
use crate::family::KernelKind;
use crate::signal::{ensure_contains, field_domain_signal, ImpulseSignal, Signal};

/// Largest sample width, in cells, a kernel may allocate.
pub const MAX_KERNEL_WIDTH: usize = 5000;

/// Lower clamp of the per-impulse Plaue bandwidth, in metres.
pub const PLAUE_MIN_SIGMA: f32 = 0.1;

/// Upper clamp of the per-impulse Plaue bandwidth, in metres.
pub const PLAUE_MAX_SIGMA: f32 = 20.0;

/// Sample width `⌈support / h⌉`, rounded up to odd.
///
/// # Errors
///
/// [`KernelError::KernelTooLarge`] above [`MAX_KERNEL_WIDTH`].
pub fn sample_width(support: f64, cell_size: f64) -> Result<usize, KernelError> {
    let raw = (support / cell_size - 1e-6).ceil().max(1.0);
    if raw > MAX_KERNEL_WIDTH as f64 {
        return Err(KernelError::KernelTooLarge {
            width: raw.min(usize::MAX as f64) as usize,
            cap: MAX_KERNEL_WIDTH,
        });
    }
    let width = raw as usize | 1;
    if width > MAX_KERNEL_WIDTH {
        return Err(KernelError::KernelTooLarge {
            width,
            cap: MAX_KERNEL_WIDTH,
        });
    }
    Ok(width)
}

/// An immutable, sampled smoothing kernel.
///
/// Samples are the kernel function evaluated at cell-centre offsets
/// `(a - k/2)·h` and multiplied by the cell size per axis, so splatting a
/// unit impulse deposits approximately unit mass. The box is discontinuous,
/// so [`KernelKind::Uniform`] instead integrates over each cell and
/// deposits exactly unit mass at every resolution.
///
/// # Examples
///
/// ```
/// use stride_core::Vec2;
/// use stride_grid::{AbstractGrid, RectDomain};
/// use stride_kernel::{ImpulseSignal, Kernel, KernelKind};
///
/// let domain = RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap();
/// let grid = AbstractGrid::new(domain, 100, 100).unwrap();
/// let kernel = Kernel::builder(KernelKind::Gaussian)
///     .sigma(1.0)
///     .cell_size(0.1)
///     .build()
///     .unwrap();
///
/// let signal = ImpulseSignal::new(domain, vec![Vec2::new(5.0, 5.0)]);
/// let density = kernel.convolve_to_grid(&signal.into(), grid).unwrap();
/// let peak = density.get(50, 50).unwrap();
/// assert!((peak - 0.01 / (2.0 * std::f32::consts::PI)).abs() < 1e-6);
/// ```
#[derive(Clone)]
pub struct Kernel {
    kind: KernelKind,
    sigma: f32,
    cell_size: f32,
    reflect: bool,
    width: usize,
    samples_1d: Option<Vec<f32>>,
    samples_2d: Option<Array2<f32>>,
    obstacles: Option<Arc<dyn ObstacleQuery>>,
}

/// Builder for [`Kernel`].
///
/// `sigma` and `cell_size` are required; reflection defaults to off and
/// obstacles to none.
pub struct KernelBuilder {
    kind: KernelKind,
    sigma: Option<f32>,
    cell_size: Option<f32>,
    reflect: bool,
    obstacles: Option<Arc<dyn ObstacleQuery>>,
}

impl KernelBuilder {
    /// Smoothing parameter `σ`.
    pub fn sigma(mut self, sigma: f32) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Grid cell size `h` the samples are laid out on.
    pub fn cell_size(mut self, h: f32) -> Self {
        self.cell_size = Some(h);
        self
    }

    /// Splat mirror images of impulses, or mirror-pad fields.
    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    /// Obstacles bounding the Plaue bandwidth. Ignored by other families.
    pub fn obstacles(mut self, obstacles: Arc<dyn ObstacleQuery>) -> Self {
        self.obstacles = Some(obstacles);
        self
    }

    /// Validate and sample.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidParameter`] for a missing, non-positive, or
    /// non-finite `σ` or `h`; [`KernelError::KernelTooLarge`] when the
    /// sample table would exceed [`MAX_KERNEL_WIDTH`].
    pub fn build(self) -> Result<Kernel, KernelError> {
        let sigma = positive("sigma", self.sigma)?;
        let h = positive("cell_size", self.cell_size)?;

        let (width, samples_1d, samples_2d) = if self.kind == KernelKind::Plaue {
            (0, None, None)
        } else {
            let (width, s1, s2) = sample_tables(self.kind, f64::from(sigma), f64::from(h))?;
            (width, s1, Some(s2))
        };

        Ok(Kernel {
            kind: self.kind,
            sigma,
            cell_size: h,
            reflect: self.reflect,
            width,
            samples_1d,
            samples_2d,
            obstacles: self.obstacles,
        })
    }
}

fn positive(name: &str, value: Option<f32>) -> Result<f32, KernelError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(KernelError::InvalidParameter {
            reason: format!("{name} must be positive and finite, got {v}"),
        }),
        None => Err(KernelError::InvalidParameter {
            reason: format!("{name} is required"),
        }),
    }
}

type Tables = (usize, Option<Vec<f32>>, Array2<f32>);

fn sample_tables(kind: KernelKind, sigma: f64, h: f64) -> Result<Tables, KernelError> {
    let width = sample_width(kind.support(sigma), h)?;
    let half = (width / 2) as f64;
    let offset = |a: usize| (a as f64 - half) * h;

    if kind == KernelKind::Uniform {
        let s1 = uniform_samples(width, sigma, h);
        let mut table = Array2::filled(width, width, 0.0f32);
        for a in 0..width {
            for b in 0..width {
                *table.at_mut(a, b) = (s1[a] * s1[b]) as f32;
            }
        }
        return Ok((width, Some(s1.into_iter().map(|v| v as f32).collect()), table));
    }

    let samples_1d = kind.is_separable().then(|| {
        (0..width)
            .map(|a| (kind.eval_1d(offset(a), sigma).unwrap_or(0.0) * h) as f32)
            .collect::<Vec<f32>>()
    });
    let mut table = Array2::filled(width, width, 0.0f32);
    for a in 0..width {
        for b in 0..width {
            *table.at_mut(a, b) = (kind.eval_2d(offset(a), offset(b), sigma) * h * h) as f32;
        }
    }
    Ok((width, samples_1d, table))
}

/// 1D box samples: the share of `[-σ/2, σ/2]` covered by each cell, over
/// `σ`. Each axis sums to one for any `h`. When `σ/h` is an odd integer
/// every cell is fully covered and the samples are exactly `h/σ`.
fn uniform_samples(width: usize, sigma: f64, h: f64) -> Vec<f64> {
    if (width as f64 * h - sigma).abs() <= 1e-6 * sigma {
        return vec![h / sigma; width];
    }
    let half = (width / 2) as f64;
    (0..width)
        .map(|a| {
            let x = (a as f64 - half) * h;
            let lo = (x - h / 2.0).max(-sigma / 2.0);
            let hi = (x + h / 2.0).min(sigma / 2.0);
            (hi - lo).max(0.0) / sigma
        })
        .collect()
}

/// Splat weights for one impulse.
enum Splat<'a> {
    Constant { width: usize, value: f32 },
    Table(&'a Array2<f32>),
}

impl Splat<'_> {
    fn width(&self) -> usize {
        match self {
            Self::Constant { width, .. } => *width,
            Self::Table(t) => t.nx(),
        }
    }
}

impl Kernel {
    /// Start building a kernel of family `kind`.
    pub fn builder(kind: KernelKind) -> KernelBuilder {
        KernelBuilder {
            kind,
            sigma: None,
            cell_size: None,
            reflect: false,
            obstacles: None,
        }
    }

    /// Non-reflecting kernel without obstacles.
    pub fn new(kind: KernelKind, sigma: f32, cell_size: f32) -> Result<Self, KernelError> {
        Self::builder(kind).sigma(sigma).cell_size(cell_size).build()
    }

    /// Kernel family.
    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// Smoothing parameter `σ`.
    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Cell size `h`.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Whether boundary reflection is on.
    pub fn reflect(&self) -> bool {
        self.reflect
    }

    /// Sample table width `k` (odd). Zero for Plaue, which samples per
    /// impulse.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the kernel convolves fields axis by axis.
    pub fn is_separable(&self) -> bool {
        self.samples_1d.is_some()
    }

    /// 1D samples of a separable kernel.
    pub fn samples_1d(&self) -> Option<&[f32]> {
        self.samples_1d.as_deref()
    }

    /// The `k × k` sample table.
    ///
    /// # Errors
    ///
    /// [`KernelError::KernelUnset`] for Plaue.
    pub fn samples_2d(&self) -> Result<&Array2<f32>, KernelError> {
        self.samples_2d.as_ref().ok_or(KernelError::KernelUnset)
    }

    /// Convolve `signal` into a fresh grid over `grid`.
    pub fn convolve_to_grid(
        &self,
        signal: &Signal,
        grid: AbstractGrid,
    ) -> Result<DataGrid<f32>, KernelError> {
        let mut out = DataGrid::new(grid);
        self.convolve(signal, &mut out)?;
        Ok(out)
    }

    /// Convolve `signal` into `out`, overwriting it.
    ///
    /// # Errors
    ///
    /// - [`KernelError::InvalidParameter`] if `out`'s cell size differs from
    ///   the kernel's.
    /// - [`KernelError::InvalidDomain`] if `out` is not inside the signal
    ///   domain.
    /// - [`KernelError::InvalidSignalType`] for Plaue on a field.
    pub fn convolve(&self, signal: &Signal, out: &mut DataGrid<f32>) -> Result<(), KernelError> {
        self.check_cell_size(out.grid())?;
        match signal {
            Signal::Impulse(s) => self.convolve_impulses(s, out),
            Signal::Field(f) => self.convolve_field(f, out),
        }
    }

    fn check_cell_size(&self, grid: &AbstractGrid) -> Result<(), KernelError> {
        let c = grid.cell_size();
        let tol = 1e-4 * self.cell_size;
        if (c.x - self.cell_size).abs() > tol || (c.y - self.cell_size).abs() > tol {
            return Err(KernelError::InvalidParameter {
                reason: format!(
                    "grid cell size {c} does not match kernel cell size {}",
                    self.cell_size
                ),
            });
        }
        Ok(())
    }

    fn convolve_impulses(
        &self,
        signal: &ImpulseSignal,
        out: &mut DataGrid<f32>,
    ) -> Result<(), KernelError> {
        ensure_contains(signal.domain(), out.domain())?;
        out.fill(0.0);
        if self.kind == KernelKind::Plaue {
            self.splat_adaptive(signal, out);
            return Ok(());
        }

        let splat = match (&self.samples_2d, self.kind) {
            (Some(t), KernelKind::Uniform) if is_constant(t) => Splat::Constant {
                width: t.nx(),
                value: t.at(0, 0),
            },
            (Some(t), _) => Splat::Table(t),
            (None, _) => return Err(KernelError::KernelUnset),
        };
        let window = splat_window(out.grid(), splat.width());
        for (p, mass) in signal.domain_signal(out.domain(), &window, self.reflect)? {
            splat_at(out, p, mass, &splat);
        }
        Ok(())
    }

    /// Per-impulse Plaue bandwidths: `σ · min(nearest neighbour, nearest
    /// obstacle)` clamped to `[0.1, 20]`, for each interior impulse as
    /// `(impulse index, σᵢ)`.
    pub fn adaptive_sigmas(&self, signal: &ImpulseSignal) -> Vec<(usize, f32)> {
        let interior: Vec<(usize, Vec2)> = signal.interior().map(|(k, p, _)| (k, p)).collect();
        interior
            .iter()
            .map(|&(k, p)| {
                let neighbour = interior
                    .iter()
                    .filter(|&&(other, _)| other != k)
                    .map(|&(_, q)| p.distance(q))
                    .fold(f32::INFINITY, f32::min);
                let obstacle = self
                    .obstacles
                    .as_ref()
                    .map_or(f32::INFINITY, |o| o.closest_distance(p));
                let local = (self.sigma * neighbour.min(obstacle))
                    .clamp(PLAUE_MIN_SIGMA, PLAUE_MAX_SIGMA);
                (k, local)
            })
            .collect()
    }

    fn splat_adaptive(&self, signal: &ImpulseSignal, out: &mut DataGrid<f32>) {
        let h = f64::from(self.cell_size);
        for (k, local) in self.adaptive_sigmas(signal) {
            let table = match sample_tables(KernelKind::Gaussian, f64::from(local), h) {
                Ok((_, _, table)) => table,
                Err(KernelError::KernelTooLarge { width, cap }) => {
                    tracing::warn!(agent = k, sigma = local, width, cap, "adaptive kernel too large; impulse skipped");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(agent = k, error = %e, "adaptive kernel unavailable; impulse skipped");
                    continue;
                }
            };
            let splat = Splat::Table(&table);
            let window = splat_window(out.grid(), splat.width());
            let p = signal.points()[k];
            let mass = signal.weight(k);
            for img in signal.images(p, &window, self.reflect) {
                splat_at(out, img, mass, &splat);
            }
        }
    }

    fn convolve_field(
        &self,
        field: &DataGrid<f32>,
        out: &mut DataGrid<f32>,
    ) -> Result<(), KernelError> {
        let table = match (&self.samples_2d, self.kind) {
            (_, KernelKind::Plaue) => {
                return Err(KernelError::InvalidSignalType {
                    kernel: self.kind.name(),
                    signal: "field",
                })
            }
            (Some(t), _) => t,
            (None, _) => return Err(KernelError::KernelUnset),
        };
        let half = self.width / 2;
        let padded = field_domain_signal(field, out.grid(), half, self.reflect)?;
        let (nx, ny) = out.resolution();

        match &self.samples_1d {
            Some(s1) => {
                let tall = ny + 2 * half;
                let mut along_x = Array2::filled(nx, tall, 0.0f32);
                for i in 0..nx {
                    for jp in 0..tall {
                        let acc: f64 = s1
                            .iter()
                            .enumerate()
                            .map(|(a, &w)| f64::from(w) * f64::from(padded.at(i + a, jp)))
                            .sum();
                        *along_x.at_mut(i, jp) = acc as f32;
                    }
                }
                for i in 0..nx {
                    for j in 0..ny {
                        let acc: f64 = s1
                            .iter()
                            .enumerate()
                            .map(|(b, &w)| f64::from(w) * f64::from(along_x.at(i, j + b)))
                            .sum();
                        out.set(i, j, acc as f32);
                    }
                }
            }
            None => {
                let k = table.nx();
                for i in 0..nx {
                    for j in 0..ny {
                        let mut acc = 0.0f64;
                        for a in 0..k {
                            for b in 0..k {
                                acc += f64::from(table.at(a, b)) * f64::from(padded.at(i + a, j + b));
                            }
                        }
                        out.set(i, j, acc as f32);
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("kind", &self.kind)
            .field("sigma", &self.sigma)
            .field("cell_size", &self.cell_size)
            .field("reflect", &self.reflect)
            .field("width", &self.width)
            .field("obstacles", &self.obstacles.is_some())
            .finish()
    }
}

/// World region whose impulses can reach `grid` with a block of `width`.
fn splat_window(grid: &AbstractGrid, width: usize) -> stride_grid::RectDomain {
    let c = grid.cell_size();
    grid.domain()
        .inflate((width / 2 + 1) as f32 * c.x.max(c.y))
}

fn is_constant(table: &Array2<f32>) -> bool {
    let first = table.at(0, 0);
    table.as_slice().iter().all(|&v| v == first)
}

/// Add `mass · splat` into the block centred on the cell containing `p`,
/// clipped to the grid.
///
/// A point on the grid's closed upper edge belongs to the last cell; only
/// points outside the grid (reflected images) centre off-grid.
fn splat_at(out: &mut DataGrid<f32>, p: Vec2, mass: f32, splat: &Splat<'_>) {
    let (ci, cj) = if out.domain().contains(p) {
        let (i, j) = out.grid().cell_of(p);
        (i as i64, j as i64)
    } else {
        out.grid().cell_of_unclipped(p)
    };
    let half = (splat.width() / 2) as i64;
    let (nx, ny) = out.resolution();
    let (i0, j0) = (ci - half, cj - half);
    let i_range = i0.max(0)..(ci + half + 1).min(nx as i64);
    let j_range = j0.max(0)..(cj + half + 1).min(ny as i64);

    let data = out.data_mut();
    for gi in i_range {
        for gj in j_range.clone() {
            let w = match splat {
                Splat::Constant { value, .. } => *value,
                Splat::Table(t) => t.at((gi - i0) as usize, (gj - j0) as usize),
            };
            *data.at_mut(gi as usize, gj as usize) += mass * w;
        }
    }
}
