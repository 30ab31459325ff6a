//! Axis-aligned rectangular world domains.

use stride_core::Vec2;

use crate::error::GridError;

/// An axis-aligned rectangle given by its minimum corner and size.
///
/// Invariant: width and height are finite and non-negative.
///
/// # Examples
///
/// ```
/// use stride_core::Vec2;
/// use stride_grid::RectDomain;
///
/// let a = RectDomain::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0)).unwrap();
/// let b = RectDomain::new(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0)).unwrap();
/// let overlap = a.intersection(&b).unwrap();
/// assert_eq!(overlap.min_corner(), Vec2::new(2.0, 2.0));
/// assert_eq!(overlap.size(), Vec2::new(2.0, 2.0));
/// assert!(a.contains(Vec2::new(4.0, 0.0)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectDomain {
    min: Vec2,
    size: Vec2,
}

impl RectDomain {
    /// Construct from a minimum corner and a size.
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDomain`] for a negative or non-finite size or a
    /// non-finite corner.
    pub fn new(min: Vec2, size: Vec2) -> Result<Self, GridError> {
        if !min.is_finite() || !size.is_finite() {
            return Err(GridError::InvalidDomain {
                reason: format!("corner {min} and size {size} must be finite"),
            });
        }
        if size.x < 0.0 || size.y < 0.0 {
            return Err(GridError::InvalidDomain {
                reason: format!("size {size} must be non-negative"),
            });
        }
        Ok(Self { min, size })
    }

    /// Construct from two opposite corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Result<Self, GridError> {
        let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        Self::new(min, max - min)
    }

    /// Minimum corner `(x0, y0)`.
    pub fn min_corner(&self) -> Vec2 {
        self.min
    }

    /// Maximum corner `(x0 + w, y0 + h)`.
    pub fn max_corner(&self) -> Vec2 {
        self.min + self.size
    }

    /// Size `(w, h)`.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Width `w`.
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Height `h`.
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Area `w · h`.
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Centre point.
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Closed point-in-rectangle test.
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max_corner();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// True when `other` lies entirely inside `self` (edges may coincide).
    pub fn contains_domain(&self, other: &RectDomain) -> bool {
        let (a, b) = (self.max_corner(), other.max_corner());
        other.min.x >= self.min.x && other.min.y >= self.min.y && b.x <= a.x && b.y <= a.y
    }

    /// Mirror images of `p` across the left, right, bottom, and top edges,
    /// in that order.
    ///
    /// Meaningful only for `p` inside the domain; for other points the
    /// images are well defined but geometrically useless.
    pub fn reflect_point(&self, p: Vec2) -> [Vec2; 4] {
        let max = self.max_corner();
        [
            Vec2::new(2.0 * self.min.x - p.x, p.y),
            Vec2::new(2.0 * max.x - p.x, p.y),
            Vec2::new(p.x, 2.0 * self.min.y - p.y),
            Vec2::new(p.x, 2.0 * max.y - p.y),
        ]
    }

    /// The overlap of two domains, or `None` when the overlap has no area.
    pub fn intersection(&self, other: &RectDomain) -> Option<RectDomain> {
        let (a, b) = (self.max_corner(), other.max_corner());
        let min = Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        if max.x > min.x && max.y > min.y {
            Some(RectDomain {
                min,
                size: max - min,
            })
        } else {
            None
        }
    }

    /// The domain grown by `margin` on every side. Negative margins shrink
    /// it, saturating at zero size.
    pub fn inflate(&self, margin: f32) -> RectDomain {
        let min = Vec2::new(self.min.x - margin, self.min.y - margin);
        let size = Vec2::new(
            (self.size.x + 2.0 * margin).max(0.0),
            (self.size.y + 2.0 * margin).max(0.0),
        );
        RectDomain { min, size }
    }
}
