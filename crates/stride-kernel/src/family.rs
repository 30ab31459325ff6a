//! The six kernel families and their radial functions.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::KernelError;

/// Kernel family.
///
/// The smoothing parameter `σ` means something different per family: the
/// full width for [`Uniform`](Self::Uniform), the half-width for
/// [`Triangle`](Self::Triangle) and [`Biweight`](Self::Biweight), the
/// standard deviation for [`Gaussian`](Self::Gaussian), the radius for
/// [`UniformCircle`](Self::UniformCircle), and a dimensionless multiplier of
/// the local spacing for [`Plaue`](Self::Plaue).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelKind {
    /// Box of width `σ`, height `1/σ` per axis.
    Uniform,
    /// Tent of half-width `σ`.
    Triangle,
    /// Quartic `(15/16σ)(1 - x²/σ²)²` of half-width `σ`.
    Biweight,
    /// Normal density truncated at `±3σ`.
    Gaussian,
    /// Disk of radius `σ`, height `1/(πσ²)`.
    UniformCircle,
    /// Gaussian whose width adapts per impulse to the distance to the
    /// nearest neighbour or obstacle.
    Plaue,
}

impl KernelKind {
    /// Every family in declaration order.
    pub const ALL: [KernelKind; 6] = [
        KernelKind::Uniform,
        KernelKind::Triangle,
        KernelKind::Biweight,
        KernelKind::Gaussian,
        KernelKind::UniformCircle,
        KernelKind::Plaue,
    ];

    /// Diameter of the compact support for smoothing parameter `sigma`.
    pub fn support(self, sigma: f64) -> f64 {
        match self {
            Self::Uniform => sigma,
            Self::Triangle | Self::Biweight | Self::UniformCircle => 2.0 * sigma,
            Self::Gaussian | Self::Plaue => 6.0 * sigma,
        }
    }

    /// Whether the 2D function is the product of two 1D functions.
    ///
    /// Plaue is a Gaussian per impulse but has no single separable table,
    /// so it reports `false`.
    pub fn is_separable(self) -> bool {
        !matches!(self, Self::UniformCircle | Self::Plaue)
    }

    /// 1D radial function, or `None` for a family without one.
    pub fn eval_1d(self, x: f64, sigma: f64) -> Option<f64> {
        let ax = x.abs();
        let v = match self {
            Self::Uniform => {
                if ax <= sigma / 2.0 {
                    1.0 / sigma
                } else {
                    0.0
                }
            }
            Self::Triangle => {
                if ax <= sigma {
                    (1.0 - ax / sigma) / sigma
                } else {
                    0.0
                }
            }
            Self::Biweight => {
                if ax <= sigma {
                    let t = 1.0 - (x * x) / (sigma * sigma);
                    15.0 / (16.0 * sigma) * t * t
                } else {
                    0.0
                }
            }
            Self::Gaussian | Self::Plaue => gaussian(x, sigma),
            Self::UniformCircle => return None,
        };
        Some(v)
    }

    /// 2D function at offset `(x, y)`.
    pub fn eval_2d(self, x: f64, y: f64, sigma: f64) -> f64 {
        match self {
            Self::UniformCircle => {
                if x * x + y * y <= sigma * sigma {
                    1.0 / (PI * sigma * sigma)
                } else {
                    0.0
                }
            }
            other => other.eval_1d(x, sigma).unwrap_or(0.0) * other.eval_1d(y, sigma).unwrap_or(0.0),
        }
    }

    /// Name used in project files and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uniform => "Uniform",
            Self::Triangle => "Triangle",
            Self::Biweight => "Biweight",
            Self::Gaussian => "Gaussian",
            Self::UniformCircle => "UniformCircle",
            Self::Plaue => "Plaue",
        }
    }
}

fn gaussian(x: f64, sigma: f64) -> f64 {
    (-(x * x) / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt())
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| KernelError::InvalidParameter {
                reason: format!("unknown kernel family {trimmed:?}"),
            })
    }
}
