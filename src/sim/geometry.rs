//! Arena geometry and placement helpers
//!
//! Axis-aligned boxes are the only shape the core reasons about: tanks,
//! walls, projectiles and boosts all collide as boxes.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ARENA_HEIGHT, DEFAULT_ARENA_WIDTH};
use crate::direction_from_angle;

/// Viewport-sized playing field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_ARENA_WIDTH,
            height: DEFAULT_ARENA_HEIGHT,
        }
    }
}

impl ArenaSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    #[inline]
    pub fn shorter_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Playable rectangle, inset from the viewport by a fixed margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn from_arena(arena: ArenaSize, margin: f32) -> Self {
        Self {
            min: Vec2::splat(margin),
            max: Vec2::new(arena.width - margin, arena.height - margin),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether a point stays at least `margin` inside every edge
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        self.shrink(margin).contains(p)
    }

    /// Bounds pulled in by `margin` on every side (never inverted)
    pub fn shrink(&self, margin: f32) -> Self {
        let center = self.center();
        Self {
            min: (self.min + Vec2::splat(margin)).min(center),
            max: (self.max - Vec2::splat(margin)).max(center),
        }
    }

    pub fn clamp(&self, p: Vec2, margin: f32) -> Vec2 {
        let inner = self.shrink(margin);
        p.clamp(inner.min, inner.max)
    }

    /// True when `p` is within `margin` of any edge (or outside)
    pub fn near_edge(&self, p: Vec2, margin: f32) -> bool {
        !self.contains_with_margin(p, margin)
    }

    /// Uniform random point, kept `margin` away from the edges
    pub fn random_point<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        let inner = self.shrink(margin);
        Vec2::new(
            sample_axis(rng, inner.min.x, inner.max.x),
            sample_axis(rng, inner.min.y, inner.max.y),
        )
    }
}

fn sample_axis<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Axis-aligned box described by center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_with_slop(other, 0.0)
    }

    /// Overlap test that also counts boxes within `slop` of touching
    pub fn overlaps_with_slop(&self, other: &Aabb, slop: f32) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half + other.half + Vec2::splat(slop);
        delta.x < reach.x && delta.y < reach.y
    }

    /// Distance from a point to the box surface (0 when inside)
    pub fn distance_to_point(&self, p: Vec2) -> f32 {
        let d = (p - self.center).abs() - self.half;
        d.max(Vec2::ZERO).length()
    }

    /// Smallest translation that moves `self` out of `other`
    pub fn separation_from(&self, other: &Aabb) -> Option<Vec2> {
        let delta = self.center - other.center;
        let overlap = self.half + other.half - delta.abs();
        if overlap.x <= 0.0 || overlap.y <= 0.0 {
            return None;
        }
        if overlap.x < overlap.y {
            let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(overlap.x * sign, 0.0))
        } else {
            let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
            Some(Vec2::new(0.0, overlap.y * sign))
        }
    }
}

#[inline]
pub fn distance_sq(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}

/// Uniformly random unit vector
pub fn random_direction<R: Rng>(rng: &mut R) -> Vec2 {
    direction_from_angle(rng.random_range(0.0..std::f32::consts::TAU))
}

/// Integer difficulty tier: one step every three levels
#[inline]
pub fn difficulty_tier(level: u32) -> u32 {
    level.saturating_sub(1) / 3
}
