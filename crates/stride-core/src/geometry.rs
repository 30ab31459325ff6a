//! Planar geometry primitives: points and line segments.
//!
//! World coordinates are `f32` to match the on-disk grid header. Predicates
//! that are sensitive to rounding (orientation tests, segment crossings)
//! promote to `f64` internally.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point or vector in world coordinates (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar 2D cross product `self.x * other.y - self.y * other.x`.
    ///
    /// Positive when `other` lies counter-clockwise of `self`.
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean length.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Polar angle in radians, in `(-pi, pi]`.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// True when both components are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An oriented line segment from `start` to `end`.
///
/// Orientation matters for flow counting: the sign of a crossing is the
/// sign of `direction × displacement`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// First endpoint.
    pub start: Vec2,
    /// Second endpoint.
    pub end: Vec2,
}

impl Segment {
    /// Construct a segment between two points.
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Vector from `start` to `end`.
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// Shortest distance from `point` to any point on the segment.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let d = self.direction();
        let len2 = d.length_squared();
        if len2 == 0.0 {
            return self.start.distance(point);
        }
        let t = ((point - self.start).dot(d) / len2).clamp(0.0, 1.0);
        (self.start + d * t).distance(point)
    }

    /// True when the two closed segments share at least one point.
    pub fn intersects(&self, other: &Segment) -> bool {
        let (p1, p2, p3, p4) = (self.start, self.end, other.start, other.end);
        let d1 = orientation(p3, p4, p1);
        let d2 = orientation(p3, p4, p2);
        let d3 = orientation(p1, p2, p3);
        let d4 = orientation(p1, p2, p4);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }
        (d1 == 0.0 && on_segment(p3, p4, p1))
            || (d2 == 0.0 && on_segment(p3, p4, p2))
            || (d3 == 0.0 && on_segment(p1, p2, p3))
            || (d4 == 0.0 && on_segment(p1, p2, p4))
    }

    /// Signed crossing of `path` over this segment.
    ///
    /// Returns `+1` or `-1` when `path` crosses the segment, with the sign
    /// of `direction × path.direction`, and `0` when the two do not
    /// intersect or `path` runs parallel to the segment.
    ///
    /// Points on the line belong to its right side. Landing on the line
    /// from the left counts as crossing, and stepping back off it to the
    /// left counts the opposite way, so touching the line and returning
    /// nets zero while passing through it via the line counts once.
    pub fn crossing_sign(&self, path: &Segment) -> i32 {
        let left_before = orientation(self.start, self.end, path.start) > 0.0;
        let left_after = orientation(self.start, self.end, path.end) > 0.0;
        if left_before == left_after {
            return 0;
        }
        if !self.intersects(path) {
            return 0;
        }
        let turn = f64::from(self.direction().x) * f64::from(path.direction().y)
            - f64::from(self.direction().y) * f64::from(path.direction().x);
        if turn > 0.0 {
            1
        } else if turn < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Twice the signed area of triangle `(a, b, c)`, computed in `f64`.
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let (bx, by) = (f64::from(b.x), f64::from(b.y));
    let (cx, cy) = (f64::from(c.x), f64::from(c.y));
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Whether collinear point `p` lies within the bounding box of `a`–`b`.
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
