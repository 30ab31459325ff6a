//! Obstacle queries used by constrained Voronoi and adaptive kernels.

use crate::geometry::{Segment, Vec2};

/// Read-only geometric queries against a static obstacle set.
///
/// Queries run concurrently from raster producer threads, hence
/// `Send + Sync`.
pub trait ObstacleQuery: Send + Sync {
    /// Distance from `point` to the nearest obstacle edge.
    ///
    /// Returns `f32::INFINITY` when there are no obstacles.
    fn closest_distance(&self, point: Vec2) -> f32;

    /// True when `segment` touches any obstacle edge.
    fn intersects(&self, segment: &Segment) -> bool;
}

/// Obstacles as a flat list of edges, queried by linear scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObstacleSet {
    edges: Vec<Segment>,
}

impl ObstacleSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit edges.
    pub fn from_edges(edges: Vec<Segment>) -> Self {
        Self { edges }
    }

    /// Append the edges of a polyline; `closed` also joins last to first.
    pub fn add_polygon(&mut self, vertices: &[Vec2], closed: bool) {
        for pair in vertices.windows(2) {
            self.edges.push(Segment::new(pair[0], pair[1]));
        }
        if closed && vertices.len() > 2 {
            self.edges
                .push(Segment::new(vertices[vertices.len() - 1], vertices[0]));
        }
    }

    /// All edges.
    pub fn edges(&self) -> &[Segment] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when the set holds no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl ObstacleQuery for ObstacleSet {
    fn closest_distance(&self, point: Vec2) -> f32 {
        self.edges
            .iter()
            .map(|e| e.distance_to(point))
            .fold(f32::INFINITY, f32::min)
    }

    fn intersects(&self, segment: &Segment) -> bool {
        self.edges.iter().any(|e| e.intersects(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ObstacleSet {
        let mut set = ObstacleSet::new();
        set.add_polygon(
            &[
                Vec2::new(4.0, 4.0),
                Vec2::new(6.0, 4.0),
                Vec2::new(6.0, 6.0),
                Vec2::new(4.0, 6.0),
            ],
            true,
        );
        set
    }

    #[test]
    fn closed_polygon_has_all_edges() {
        assert_eq!(square().len(), 4);
    }

    #[test]
    fn empty_set_is_infinitely_far() {
        let set = ObstacleSet::new();
        assert!(set.closest_distance(Vec2::ZERO).is_infinite());
        assert!(!set.intersects(&Segment::new(Vec2::ZERO, Vec2::new(1.0, 1.0))));
    }

    #[test]
    fn distance_to_square() {
        let d = square().closest_distance(Vec2::new(2.0, 5.0));
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn sight_line_through_square_is_blocked() {
        let s = square();
        assert!(s.intersects(&Segment::new(Vec2::new(2.0, 5.0), Vec2::new(8.0, 5.0))));
        assert!(!s.intersects(&Segment::new(Vec2::new(2.0, 1.0), Vec2::new(8.0, 1.0))));
    }
}
