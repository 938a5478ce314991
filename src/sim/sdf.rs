//! SDF-based swept probes
//!
//! Fast projectiles can cross a thin wall in a single tick. Instead of testing
//! only the end position, the probe sphere-traces the whole segment travelled
//! this tick against each candidate box.

use glam::Vec2;

use super::geometry::Aabb;

/// Signed distance to an axis-aligned box
#[inline]
pub fn sd_box(p: Vec2, aabb: &Aabb) -> f32 {
    let d = (p - aabb.center).abs() - aabb.half;
    d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0)
}

/// Outward surface normal by central differences
pub fn sdf_gradient<F>(p: Vec2, sdf: F) -> Vec2
where
    F: Fn(Vec2) -> f32,
{
    let eps = 0.5;
    let dx = sdf(p + Vec2::new(eps, 0.0)) - sdf(p - Vec2::new(eps, 0.0));
    let dy = sdf(p + Vec2::new(0.0, eps)) - sdf(p - Vec2::new(0.0, eps));
    Vec2::new(dx, dy).normalize_or_zero()
}

/// Sphere-trace from `start` to `end` for the first point within `radius`
/// of the surface. Returns the fraction of the path travelled.
pub fn raymarch_collision<F>(
    start: Vec2,
    end: Vec2,
    radius: f32,
    max_steps: usize,
    sdf: F,
) -> Option<f32>
where
    F: Fn(Vec2) -> f32,
{
    let dir = end - start;
    let total_dist = dir.length();
    if total_dist < 0.001 {
        return (sdf(start) < radius).then_some(0.0);
    }
    let dir_norm = dir / total_dist;

    let mut t = 0.0;

    for _ in 0..max_steps {
        let p = start + dir_norm * t;
        let d = sdf(p);

        if d < radius {
            return Some(t / total_dist);
        }

        // Step by distance to surface (sphere tracing)
        let step = (d - radius * 0.5).max(0.5);
        t += step;

        if t >= total_dist {
            break;
        }
    }

    // Last chance at the exact end point
    (sdf(end) < radius).then_some(1.0)
}

/// Swept probe of a moving circle against a box.
/// Returns the fraction of the path at which contact starts.
pub fn sweep_box(start: Vec2, end: Vec2, radius: f32, aabb: &Aabb, max_steps: usize) -> Option<f32> {
    raymarch_collision(start, end, radius, max_steps, |p| sd_box(p, aabb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sd_box_inside_and_outside() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::new(10.0, 5.0));
        assert!((sd_box(Vec2::new(15.0, 0.0), &aabb) - 5.0).abs() < 1e-5);
        assert!((sd_box(Vec2::new(0.0, 0.0), &aabb) + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_catches_thin_wall_between_endpoints() {
        // 4px thick wall, projectile jumps 60px in one tick
        let wall = Aabb::new(Vec2::new(50.0, 0.0), Vec2::new(2.0, 40.0));
        let start = Vec2::new(20.0, 0.0);
        let end = Vec2::new(80.0, 0.0);

        // Neither endpoint overlaps the wall
        assert!(sd_box(start, &wall) > 3.0);
        assert!(sd_box(end, &wall) > 3.0);

        let t = sweep_box(start, end, 3.0, &wall, 32).expect("swept probe should hit");
        assert!(t > 0.3 && t < 0.6, "t = {t}");
    }

    #[test]
    fn test_sweep_misses_parallel_path() {
        let wall = Aabb::new(Vec2::new(50.0, 0.0), Vec2::new(2.0, 10.0));
        let hit = sweep_box(Vec2::new(0.0, 40.0), Vec2::new(100.0, 40.0), 3.0, &wall, 32);
        assert!(hit.is_none());
    }

    #[test]
    fn test_gradient_points_away_from_box() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let n = sdf_gradient(Vec2::new(20.0, 0.0), |p| sd_box(p, &aabb));
        assert!((n.x - 1.0).abs() < 1e-3);

        // Inside, the normal follows the shallowest face
        let n = sdf_gradient(Vec2::new(0.0, -8.0), |p| sd_box(p, &aabb));
        assert!((n.y + 1.0).abs() < 1e-3);
    }
}
