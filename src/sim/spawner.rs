//! Level generation
//!
//! Produces the enemy set and wall layout for a level by rejection sampling.
//! Nothing here touches the registry; the caller merges the plan.

use glam::Vec2;
use rand::Rng;

use super::geometry::{Aabb, ArenaSize, Bounds, distance_sq};
use super::state::WallKind;
use crate::tuning::Tuning;

/// An enemy waiting to be registered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub pos: Vec2,
    pub health: i32,
}

/// A wall waiting to be registered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSpawn {
    pub shape: Aabb,
    pub kind: WallKind,
    pub health: i32,
}

/// Everything a level starts with
#[derive(Debug, Clone, Default)]
pub struct LevelSpawn {
    pub enemies: Vec<EnemySpawn>,
    pub walls: Vec<WallSpawn>,
}

/// Number of enemies for a level: one more every two levels, capped
pub fn enemy_count(level: u32, tuning: &Tuning) -> usize {
    let level = level.max(1);
    (1 + (level as usize - 1) / 2).min(tuning.max_enemies)
}

pub fn enemy_health(level: u32, tuning: &Tuning) -> i32 {
    let level = level.max(1);
    tuning.enemy_base_health + tuning.enemy_health_per_level * (level as i32 - 1)
}

/// Minimum enemy-to-tank distance at spawn time
pub fn min_tank_distance(level: u32, arena: ArenaSize, tuning: &Tuning) -> f32 {
    tuning
        .enemy_spawn_distance
        .distance(level.max(1), arena.shorter_side())
}

/// Build enemies and walls for `level`
pub fn spawn_level<R: Rng>(
    level: u32,
    arena: ArenaSize,
    tank_pos: Vec2,
    boost_pos: Option<Vec2>,
    tuning: &Tuning,
    rng: &mut R,
) -> LevelSpawn {
    let enemies = spawn_enemies(level, arena, tank_pos, tuning, rng);
    let mut walls = boundary_walls(arena, tuning);
    walls.extend(obstacle_walls(arena, tank_pos, boost_pos, tuning, rng));
    log::info!(
        "Level {}: {} enemies, {} walls",
        level,
        enemies.len(),
        walls.len()
    );
    LevelSpawn { enemies, walls }
}

pub fn spawn_enemies<R: Rng>(
    level: u32,
    arena: ArenaSize,
    tank_pos: Vec2,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<EnemySpawn> {
    let bounds = Bounds::from_arena(arena, tuning.bounds_margin);
    let wanted = enemy_count(level, tuning);
    let health = enemy_health(level, tuning);
    let min_tank = min_tank_distance(level, arena, tuning);
    let half = tuning.enemy_size / 2.0;

    let mut placed: Vec<Vec2> = Vec::with_capacity(wanted);
    for slot in 0..wanted {
        let found = (0..tuning.placement_attempts).find_map(|_| {
            let candidate = bounds.random_point(rng, half);
            is_valid_enemy_position(candidate, &bounds, tank_pos, min_tank, &placed, tuning)
                .then_some(candidate)
        });
        match found {
            Some(pos) => placed.push(pos),
            None => log::warn!(
                "Level {}: no room for enemy {} after {} attempts",
                level,
                slot,
                tuning.placement_attempts
            ),
        }
    }

    placed
        .into_iter()
        .map(|pos| EnemySpawn { pos, health })
        .collect()
}

/// Enemy placement constraint check
pub fn is_valid_enemy_position(
    candidate: Vec2,
    bounds: &Bounds,
    tank_pos: Vec2,
    min_tank_distance: f32,
    placed: &[Vec2],
    tuning: &Tuning,
) -> bool {
    let spacing_sq = tuning.enemy_min_spacing * tuning.enemy_min_spacing;
    bounds.contains_with_margin(candidate, tuning.enemy_size / 2.0)
        && distance_sq(candidate, tank_pos) >= min_tank_distance * min_tank_distance
        && placed.iter().all(|p| distance_sq(candidate, *p) >= spacing_sq)
}

/// The four arena-edge walls, in top/right/bottom/left order
pub fn boundary_walls(arena: ArenaSize, tuning: &Tuning) -> Vec<WallSpawn> {
    let t = tuning.wall_thickness;
    let (w, h) = (arena.width, arena.height);
    let shapes = [
        Aabb::new(Vec2::new(w / 2.0, t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
        Aabb::new(Vec2::new(w - t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
        Aabb::new(Vec2::new(w / 2.0, h - t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
        Aabb::new(Vec2::new(t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
    ];
    shapes
        .into_iter()
        .map(|shape| WallSpawn {
            shape,
            kind: WallKind::Boundary,
            health: tuning.boundary_wall_health,
        })
        .collect()
}

/// Randomly placed interior obstacles
pub fn obstacle_walls<R: Rng>(
    arena: ArenaSize,
    tank_pos: Vec2,
    boost_pos: Option<Vec2>,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<WallSpawn> {
    let bounds = Bounds::from_arena(arena, tuning.bounds_margin);
    let long = tuning.obstacle_length / 2.0;
    let short = tuning.wall_thickness / 2.0;

    let mut placed: Vec<Vec2> = Vec::with_capacity(tuning.obstacle_count);
    let mut walls = Vec::with_capacity(tuning.obstacle_count);
    for slot in 0..tuning.obstacle_count {
        let found = (0..tuning.placement_attempts).find_map(|_| {
            let candidate = bounds.random_point(rng, long);
            let horizontal = rng.random_bool(0.5);
            is_valid_obstacle_position(candidate, tank_pos, boost_pos, &placed, tuning)
                .then_some((candidate, horizontal))
        });
        let Some((center, horizontal)) = found else {
            log::warn!(
                "No room for obstacle {} after {} attempts",
                slot,
                tuning.placement_attempts
            );
            continue;
        };
        placed.push(center);
        let half = if horizontal {
            Vec2::new(long, short)
        } else {
            Vec2::new(short, long)
        };
        walls.push(WallSpawn {
            shape: Aabb::new(center, half),
            kind: WallKind::Obstacle,
            health: tuning.obstacle_health,
        });
    }
    walls
}

/// Obstacle placement constraint check (center distances)
pub fn is_valid_obstacle_position(
    candidate: Vec2,
    tank_pos: Vec2,
    boost_pos: Option<Vec2>,
    placed: &[Vec2],
    tuning: &Tuning,
) -> bool {
    let tank_sq = tuning.obstacle_tank_clearance * tuning.obstacle_tank_clearance;
    let spacing_sq = tuning.obstacle_spacing * tuning.obstacle_spacing;
    let boost_sq = tuning.obstacle_boost_clearance * tuning.obstacle_boost_clearance;

    distance_sq(candidate, tank_pos) >= tank_sq
        && placed.iter().all(|p| distance_sq(candidate, *p) >= spacing_sq)
        && boost_pos.is_none_or(|b| distance_sq(candidate, b) >= boost_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_enemy_count_and_health_by_level() {
        let tuning = Tuning::default();
        assert_eq!(enemy_count(1, &tuning), 1);
        assert_eq!(enemy_count(2, &tuning), 1);
        assert_eq!(enemy_count(3, &tuning), 2);
        assert_eq!(enemy_count(5, &tuning), 3);
        assert_eq!(enemy_count(40, &tuning), 3);

        assert_eq!(enemy_health(1, &tuning), 100);
        assert_eq!(enemy_health(6, &tuning), 110);
    }

    #[test]
    fn test_level_one_scenario_800_by_600() {
        let tuning = Tuning::default();
        let arena = ArenaSize::new(800.0, 600.0);
        let tank = Vec2::new(100.0, 100.0);
        assert!((min_tank_distance(1, arena, &tuning) - 510.0).abs() < 1e-3);

        let mut with_enemy = 0;
        for seed in 0..32 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let enemies = spawn_enemies(1, arena, tank, &tuning, &mut rng);
            assert!(enemies.len() <= 1);
            for enemy in &enemies {
                assert_eq!(enemy.health, 100);
                assert!(enemy.pos.distance(tank) >= 510.0);
            }
            with_enemy += enemies.len();
        }
        // Ten attempts almost always find the far corner
        assert!(with_enemy >= 20, "only {with_enemy} of 32 seeds placed an enemy");
    }

    #[test]
    fn test_boundary_walls_line_the_edges() {
        let tuning = Tuning::default();
        let walls = boundary_walls(ArenaSize::new(800.0, 600.0), &tuning);
        assert_eq!(walls.len(), 4);
        assert!(walls.iter().all(|w| w.kind == WallKind::Boundary));
        assert_eq!(walls[0].shape.min(), Vec2::new(0.0, 0.0));
        assert_eq!(walls[2].shape.max(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_spawn_level_includes_boundary_and_obstacles() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let plan = spawn_level(
            4,
            ArenaSize::new(1024.0, 768.0),
            Vec2::new(512.0, 384.0),
            None,
            &tuning,
            &mut rng,
        );
        let boundary = plan
            .walls
            .iter()
            .filter(|w| w.kind == WallKind::Boundary)
            .count();
        assert_eq!(boundary, 4);
        assert!(plan.walls.len() <= 4 + tuning.obstacle_count);
        assert!(plan.enemies.len() <= enemy_count(4, &tuning));
    }

    #[test]
    fn test_tiny_arena_skips_instead_of_failing() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let arena = ArenaSize::new(120.0, 120.0);
        let enemies = spawn_enemies(5, arena, Vec2::new(60.0, 60.0), &tuning, &mut rng);
        assert!(enemies.is_empty());
        let walls = obstacle_walls(arena, Vec2::new(60.0, 60.0), None, &tuning, &mut rng);
        assert!(walls.is_empty());
    }

    proptest! {
        #[test]
        fn prop_enemy_placement_satisfies_constraints(
            width in 300.0f32..1600.0,
            height in 300.0f32..1200.0,
            tx in 0.0f32..1.0,
            ty in 0.0f32..1.0,
            level in 1u32..30,
            seed in any::<u64>(),
        ) {
            let tuning = Tuning::default();
            let arena = ArenaSize::new(width, height);
            let bounds = Bounds::from_arena(arena, tuning.bounds_margin);
            let tank = bounds.min + (bounds.max - bounds.min) * Vec2::new(tx, ty);
            let mut rng = Pcg32::seed_from_u64(seed);

            let enemies = spawn_enemies(level, arena, tank, &tuning, &mut rng);
            let min_tank = min_tank_distance(level, arena, &tuning);
            prop_assert!(enemies.len() <= enemy_count(level, &tuning));
            for (i, enemy) in enemies.iter().enumerate() {
                prop_assert!(bounds.contains_with_margin(enemy.pos, tuning.enemy_size / 2.0));
                prop_assert!(enemy.pos.distance(tank) >= min_tank - 1e-3);
                for other in &enemies[i + 1..] {
                    prop_assert!(enemy.pos.distance(other.pos) >= tuning.enemy_min_spacing - 1e-3);
                }
            }
        }

        #[test]
        fn prop_obstacle_placement_satisfies_constraints(
            width in 300.0f32..1600.0,
            height in 300.0f32..1200.0,
            tx in 0.0f32..1.0,
            ty in 0.0f32..1.0,
            bx in 0.0f32..1.0,
            by in 0.0f32..1.0,
            seed in any::<u64>(),
        ) {
            let tuning = Tuning::default();
            let arena = ArenaSize::new(width, height);
            let bounds = Bounds::from_arena(arena, tuning.bounds_margin);
            let span = bounds.max - bounds.min;
            let tank = bounds.min + span * Vec2::new(tx, ty);
            let boost = bounds.min + span * Vec2::new(bx, by);
            let mut rng = Pcg32::seed_from_u64(seed);

            let walls = obstacle_walls(arena, tank, Some(boost), &tuning, &mut rng);
            prop_assert!(walls.len() <= tuning.obstacle_count);
            for (i, wall) in walls.iter().enumerate() {
                let c = wall.shape.center;
                prop_assert!(c.distance(tank) >= tuning.obstacle_tank_clearance - 1e-3);
                prop_assert!(c.distance(boost) >= tuning.obstacle_boost_clearance - 1e-3);
                for other in &walls[i + 1..] {
                    prop_assert!(c.distance(other.shape.center) >= tuning.obstacle_spacing - 1e-3);
                }
            }
        }
    }
}
