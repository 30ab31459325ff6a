//! Reusable trajectory fixtures.
//!
//! - [`straight_walkers`]: agents moving with a constant velocity.
//! - [`circling_agents`]: agents orbiting the origin at a fixed rate.
//! - [`line_crossers`]: agents that step over `y = line_y` at chosen frames.
//! - [`random_walkers`]: seeded ChaCha8 random walks confined to a domain.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stride_core::{Frame, MemoryTrajectory, ObstacleSet, Vec2};
use stride_grid::RectDomain;

/// `agents` walkers starting at `(1, 1 + k)` and moving `velocity` m/s.
pub fn straight_walkers(agents: usize, frames: usize, velocity: Vec2, dt: f32) -> MemoryTrajectory {
    let frames = (0..frames)
        .map(|t| {
            Frame::from_positions(
                (0..agents).map(|k| Vec2::new(1.0, 1.0 + k as f32) + velocity * (t as f32 * dt)),
            )
        })
        .collect();
    MemoryTrajectory::new(frames).with_step_size(dt)
}

/// `agents` agents on a circle of `radius` around the origin, evenly
/// phased, turning counter-clockwise at `deg_per_sec`.
pub fn circling_agents(
    agents: usize,
    frames: usize,
    radius: f32,
    deg_per_sec: f32,
    dt: f32,
) -> MemoryTrajectory {
    let frames = (0..frames)
        .map(|t| {
            Frame::from_positions((0..agents).map(|k| {
                let phase = k as f32 * std::f32::consts::TAU / agents.max(1) as f32;
                let angle = phase + (deg_per_sec * t as f32 * dt).to_radians();
                Vec2::new(radius * angle.cos(), radius * angle.sin())
            }))
        })
        .collect();
    MemoryTrajectory::new(frames).with_step_size(dt)
}

/// One agent per entry of `crossings`: agent `k` stands at
/// `(2 + 3k, line_y - 1)` and is at `(2 + 3k, line_y + 1)` from frame
/// `crossings[k]` on, so its `t-1 → t` step crosses upward exactly there.
pub fn line_crossers(frames: usize, crossings: &[usize], line_y: f32) -> MemoryTrajectory {
    let frames = (0..frames)
        .map(|t| {
            Frame::from_positions(crossings.iter().enumerate().map(|(k, &at)| {
                let y = if t < at { line_y - 1.0 } else { line_y + 1.0 };
                Vec2::new(2.0 + 3.0 * k as f32, y)
            }))
        })
        .collect();
    MemoryTrajectory::new(frames).with_step_size(0.1)
}

/// Seeded random walks: uniform start in `domain`, then steps uniform in
/// `[-step, step]` per axis, clamped back into the domain.
pub fn random_walkers(
    seed: u64,
    agents: usize,
    frames: usize,
    domain: &RectDomain,
    step: f32,
) -> MemoryTrajectory {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (lo, hi) = (domain.min_corner(), domain.max_corner());
    let mut positions: Vec<Vec2> = (0..agents)
        .map(|_| {
            Vec2::new(
                lo.x + rng.random::<f32>() * domain.width(),
                lo.y + rng.random::<f32>() * domain.height(),
            )
        })
        .collect();

    let mut out = Vec::with_capacity(frames);
    for _ in 0..frames {
        out.push(Frame::from_positions(positions.iter().copied()));
        for p in &mut positions {
            let dx = (rng.random::<f32>() * 2.0 - 1.0) * step;
            let dy = (rng.random::<f32>() * 2.0 - 1.0) * step;
            *p = Vec2::new((p.x + dx).clamp(lo.x, hi.x), (p.y + dy).clamp(lo.y, hi.y));
        }
    }
    MemoryTrajectory::new(out).with_step_size(0.1)
}

/// The four walls of `domain` as one closed polygon.
pub fn box_walls(domain: &RectDomain) -> ObstacleSet {
    let (lo, hi) = (domain.min_corner(), domain.max_corner());
    let mut walls = ObstacleSet::new();
    walls.add_polygon(
        &[lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y)],
        true,
    );
    walls
}
