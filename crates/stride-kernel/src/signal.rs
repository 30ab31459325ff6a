//! Impulse and field signals.
//!
//! A signal is what a kernel smooths: either a set of weighted points
//! ([`ImpulseSignal`]) or a dense per-cell field (a [`DataGrid`]). The
//! [`Signal`] sum type lets [`Kernel::convolve`](crate::Kernel::convolve)
//! dispatch once on the variant.

use smallvec::SmallVec;
use stride_core::{Frame, Vec2};
use stride_grid::{AbstractGrid, Array2, DataGrid, RectDomain};

use crate::error::KernelError;

/// An impulse together with its in-window reflections.
pub type ImpulseImages = SmallVec<[Vec2; 5]>;

/// A set of 2D points, each carrying a mass (default 1).
///
/// Points outside the signal domain are kept but ignored by every
/// consumer.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpulseSignal {
    domain: RectDomain,
    points: Vec<Vec2>,
    weights: Option<Vec<f32>>,
}

impl ImpulseSignal {
    /// Unit impulses at `points`.
    pub fn new(domain: RectDomain, points: Vec<Vec2>) -> Self {
        Self {
            domain,
            points,
            weights: None,
        }
    }

    /// Unit impulses at every agent position of `frame`.
    pub fn from_frame(domain: RectDomain, frame: &Frame) -> Self {
        Self::new(domain, frame.positions().collect())
    }

    /// Attach one weight per point.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidParameter`] if the lengths differ or a weight
    /// is not finite.
    pub fn with_weights(mut self, weights: Vec<f32>) -> Result<Self, KernelError> {
        if weights.len() != self.points.len() {
            return Err(KernelError::InvalidParameter {
                reason: format!(
                    "{} weights for {} impulses",
                    weights.len(),
                    self.points.len()
                ),
            });
        }
        if let Some(bad) = weights.iter().position(|w| !w.is_finite()) {
            return Err(KernelError::InvalidParameter {
                reason: format!("weight of impulse {bad} is not finite"),
            });
        }
        self.weights = Some(weights);
        Ok(self)
    }

    /// The signal's own domain.
    pub fn domain(&self) -> &RectDomain {
        &self.domain
    }

    /// All points, including ones outside the domain.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mass of point `k`.
    pub fn weight(&self, k: usize) -> f32 {
        self.weights
            .as_ref()
            .and_then(|w| w.get(k).copied())
            .unwrap_or(1.0)
    }

    /// `(index, point, weight)` for the points inside the signal domain.
    pub fn interior(&self) -> impl Iterator<Item = (usize, Vec2, f32)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| self.domain.contains(**p))
            .map(|(k, &p)| (k, p, self.weight(k)))
    }

    /// Images of one interior impulse that fall inside `window`: the point
    /// itself, then its reflections across the left, right, bottom, and top
    /// edges of the signal domain when `reflect` is set.
    pub fn images(&self, p: Vec2, window: &RectDomain, reflect: bool) -> ImpulseImages {
        let mut out = ImpulseImages::new();
        if window.contains(p) {
            out.push(p);
        }
        if reflect {
            out.extend(
                self.domain
                    .reflect_point(p)
                    .into_iter()
                    .filter(|r| window.contains(*r)),
            );
        }
        out
    }

    /// The impulses relevant to convolving over `convolve`: every interior
    /// impulse image lying in `window`, paired with its mass.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidDomain`] unless `convolve` lies inside the
    /// signal domain.
    pub fn domain_signal(
        &self,
        convolve: &RectDomain,
        window: &RectDomain,
        reflect: bool,
    ) -> Result<Vec<(Vec2, f32)>, KernelError> {
        ensure_contains(&self.domain, convolve)?;
        Ok(self
            .interior()
            .flat_map(|(_, p, w)| {
                self.images(p, window, reflect)
                    .into_iter()
                    .map(move |img| (img, w))
            })
            .collect())
    }
}

/// The input to a convolution.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// Weighted points.
    Impulse(ImpulseSignal),
    /// A dense field; the grid is the signal.
    Field(DataGrid<f32>),
}

impl Signal {
    /// Variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Impulse(_) => "impulse",
            Self::Field(_) => "field",
        }
    }

    /// The signal's domain.
    pub fn domain(&self) -> &RectDomain {
        match self {
            Self::Impulse(s) => s.domain(),
            Self::Field(g) => g.domain(),
        }
    }
}

impl From<ImpulseSignal> for Signal {
    fn from(s: ImpulseSignal) -> Self {
        Self::Impulse(s)
    }
}

impl From<DataGrid<f32>> for Signal {
    fn from(g: DataGrid<f32>) -> Self {
        Self::Field(g)
    }
}

/// Padded view of a field over the cells of `convolve`.
///
/// Returns an array of shape `(nx + 2·pad, ny + 2·pad)` where `(nx, ny)` is
/// the resolution of `convolve`. Cells covered by the field hold its values;
/// the remaining ring is filled by half-sample mirroring across the field's
/// edges when `reflect` is set (cell `-1` mirrors cell `0`), and zero
/// otherwise. Anything beyond a single mirror is zero.
///
/// # Errors
///
/// [`KernelError::InvalidDomain`] unless `convolve` lies inside the field's
/// domain and shares its cell size.
pub fn field_domain_signal(
    field: &DataGrid<f32>,
    convolve: &AbstractGrid,
    pad: usize,
    reflect: bool,
) -> Result<Array2<f32>, KernelError> {
    ensure_contains(field.domain(), convolve.domain())?;
    let (fc, cc) = (field.grid().cell_size(), convolve.cell_size());
    if (fc.x - cc.x).abs() > 1e-4 * fc.x || (fc.y - cc.y).abs() > 1e-4 * fc.y {
        return Err(KernelError::InvalidDomain {
            reason: format!("field cell size {fc} differs from convolution cell size {cc}"),
        });
    }

    let (fnx, fny) = (field.grid().nx() as i64, field.grid().ny() as i64);
    let (ox, oy) = field.grid().cell_of_unclipped(convolve.cell_center(0, 0));
    let (nx, ny) = convolve.resolution();
    let pad_i = pad as i64;
    let mut out = Array2::filled(nx + 2 * pad, ny + 2 * pad, 0.0f32);

    for a in 0..out.nx() {
        let Some(fi) = source_index(ox + a as i64 - pad_i, fnx, reflect) else {
            continue;
        };
        for b in 0..out.ny() {
            if let Some(fj) = source_index(oy + b as i64 - pad_i, fny, reflect) {
                *out.at_mut(a, b) = field.data().at(fi, fj);
            }
        }
    }
    Ok(out)
}

/// Field index backing padded index `i`, or `None` for a zero cell.
fn source_index(i: i64, n: i64, reflect: bool) -> Option<usize> {
    let mirrored = if (0..n).contains(&i) {
        i
    } else if !reflect {
        return None;
    } else if i < 0 {
        -1 - i
    } else {
        2 * n - 1 - i
    };
    (0..n).contains(&mirrored).then_some(mirrored as usize)
}

pub(crate) fn ensure_contains(outer: &RectDomain, inner: &RectDomain) -> Result<(), KernelError> {
    if outer.contains_domain(inner) {
        Ok(())
    } else {
        Err(KernelError::InvalidDomain {
            reason: format!(
                "convolution domain [{}, {}] is not inside signal domain [{}, {}]",
                inner.min_corner(),
                inner.max_corner(),
                outer.min_corner(),
                outer.max_corner()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> RectDomain {
        RectDomain::new(Vec2::ZERO, Vec2::new(size, size)).unwrap()
    }

    #[test]
    fn domain_signal_rejects_outside_convolve_domain() {
        let s = ImpulseSignal::new(square(10.0), vec![Vec2::new(1.0, 1.0)]);
        let big = square(12.0);
        assert!(matches!(
            s.domain_signal(&big, &big, false),
            Err(KernelError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn exterior_points_are_ignored() {
        let s = ImpulseSignal::new(
            square(10.0),
            vec![Vec2::new(1.0, 1.0), Vec2::new(-1.0, 1.0), Vec2::new(5.0, 11.0)],
        );
        let d = square(10.0);
        let out = s.domain_signal(&d, &d, false).unwrap();
        assert_eq!(out, vec![(Vec2::new(1.0, 1.0), 1.0)]);
    }

    #[test]
    fn reflections_are_filtered_by_window() {
        let d = square(10.0);
        let s = ImpulseSignal::new(d, vec![Vec2::new(1.0, 5.0)])
            .with_weights(vec![2.0])
            .unwrap();
        let window = d.inflate(1.5);
        let out = s.domain_signal(&d, &window, true).unwrap();
        assert_eq!(
            out,
            vec![(Vec2::new(1.0, 5.0), 2.0), (Vec2::new(-1.0, 5.0), 2.0)]
        );
    }

    #[test]
    fn weight_length_is_checked() {
        let s = ImpulseSignal::new(square(1.0), vec![Vec2::ZERO]);
        assert!(s.clone().with_weights(vec![]).is_err());
        assert!(s.with_weights(vec![f32::NAN]).is_err());
    }

    #[test]
    fn field_padding_mirrors_half_sample() {
        let g = AbstractGrid::new(square(3.0), 3, 3).unwrap();
        let cells: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let field = DataGrid::from_cells(g, cells).unwrap();

        let padded = field_domain_signal(&field, &g, 1, true).unwrap();
        assert_eq!(padded.shape(), (5, 5));
        // Inner block is the field.
        assert_eq!(padded.at(1, 1), 0.0);
        assert_eq!(padded.at(3, 3), 8.0);
        // Cell -1 mirrors cell 0 on each axis.
        assert_eq!(padded.at(0, 2), field.get(0, 1).unwrap());
        assert_eq!(padded.at(4, 2), field.get(2, 1).unwrap());
        assert_eq!(padded.at(0, 0), field.get(0, 0).unwrap());

        let zeros = field_domain_signal(&field, &g, 1, false).unwrap();
        assert_eq!(zeros.at(0, 2), 0.0);
        assert_eq!(zeros.at(2, 2), 4.0);
    }

    #[test]
    fn padding_beyond_one_mirror_is_zero() {
        let g = AbstractGrid::new(square(2.0), 2, 2).unwrap();
        let field = DataGrid::from_cells(g, vec![1.0; 4]).unwrap();
        let padded = field_domain_signal(&field, &g, 3, true).unwrap();
        assert_eq!(padded.shape(), (8, 8));
        assert_eq!(padded.at(3, 3), 1.0);
        assert_eq!(padded.at(1, 3), 1.0);
        assert_eq!(padded.at(0, 3), 0.0);
    }

    #[test]
    fn sub_window_uses_real_neighbours() {
        let field_grid = AbstractGrid::new(square(4.0), 4, 4).unwrap();
        let cells: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let field = DataGrid::from_cells(field_grid, cells).unwrap();
        let inner = AbstractGrid::new(
            RectDomain::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)).unwrap(),
            2,
            2,
        )
        .unwrap();
        let padded = field_domain_signal(&field, &inner, 1, false).unwrap();
        assert_eq!(padded.shape(), (4, 4));
        assert_eq!(padded.as_slice(), field.cells());
    }
}
