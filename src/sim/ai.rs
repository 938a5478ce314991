//! Enemy AI
//!
//! Each enemy either wanders on a random heading or, once the player comes
//! within detection range, turns to face it, closes in and fires. Decisions
//! are re-evaluated at most once per `ai_update_interval_ms`.

use glam::Vec2;

use super::geometry::{difficulty_tier, distance_sq, random_direction};
use super::physics::PhysicsWorld;
use super::projectile::{self, Shooter};
use super::state::{AiMode, EntityId, GameState};
use crate::{angle_towards, direction_from_angle};
use crate::tuning::Tuning;

/// Level-scaled enemy parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    pub speed: f32,
    pub detection_radius: f32,
    pub shooting_radius: f32,
    pub shot_interval_ms: u64,
}

impl AiProfile {
    pub fn for_level(level: u32, tuning: &Tuning) -> Self {
        let tier = difficulty_tier(level) as f32;
        Self {
            speed: tuning.enemy_base_speed * (1.0 + 0.31 * tier),
            detection_radius: tuning.detection_radius * (1.0 + 0.33 * tier),
            shooting_radius: tuning.shooting_radius * (1.0 + 0.31 * tier),
            shot_interval_ms: (tuning.enemy_shot_interval_ms as f32 / (1.0 + 1.31 * tier)) as u64,
        }
    }
}

/// Run one AI pass if the debounce interval has elapsed. Returns true when
/// the pass ran.
pub fn run_ai(state: &mut GameState, physics: &mut dyn PhysicsWorld, now_ms: u64) -> bool {
    if state
        .last_ai_ms
        .is_some_and(|t| now_ms.saturating_sub(t) < state.tuning.ai_update_interval_ms)
    {
        return false;
    }
    state.last_ai_ms = Some(now_ms);

    let profile = AiProfile::for_level(state.level.level, &state.tuning);
    let standoff = state
        .tuning
        .enemy_standoff
        .distance(state.level.level.max(1), state.arena.shorter_side());
    let tank_pos = state.tank_position(physics).ok();
    let detection_sq = profile.detection_radius * profile.detection_radius;
    let shooting_sq = profile.shooting_radius * profile.shooting_radius;
    let half = state.tuning.enemy_size / 2.0;
    let bounds = state.bounds;

    let mut shots: Vec<(EntityId, f32)> = Vec::new();

    for i in 0..state.enemies.len() {
        let (id, body) = (state.enemies[i].id, state.enemies[i].body);
        let Some(pos) = physics.get(body).map(|b| b.pos) else {
            log::warn!("Enemy {} has no body, skipping AI", id);
            continue;
        };

        let in_range = tank_pos.filter(|t| distance_sq(pos, *t) < detection_sq);
        let (vel, angle) = match in_range {
            Some(target) => {
                let dist_sq = distance_sq(pos, target);
                let angle = angle_towards(pos, target);
                state.enemies[i].mode = AiMode::Pursue;
                if dist_sq <= shooting_sq {
                    shots.push((id, angle));
                }
                // Compared squared, so pursuers close in almost to hull contact
                let vel = if dist_sq > standoff {
                    direction_from_angle(angle) * profile.speed
                } else {
                    Vec2::ZERO
                };
                (vel, angle)
            }
            None => {
                let (current, last_change) =
                    (state.enemies[i].wander_dir, state.enemies[i].last_dir_change_ms);
                let stale = now_ms.saturating_sub(last_change) >= state.tuning.wander_change_interval_ms;
                let near_edge = bounds.near_edge(pos, half + state.tuning.wander_edge_margin);
                let dir = match current {
                    Some(dir) if !stale && !near_edge => dir,
                    _ => {
                        let mut dir = random_direction(&mut state.rng);
                        if near_edge && dir.dot(bounds.center() - pos) < 0.0 {
                            dir = -dir;
                        }
                        let enemy = &mut state.enemies[i];
                        enemy.wander_dir = Some(dir);
                        enemy.last_dir_change_ms = now_ms;
                        dir
                    }
                };
                state.enemies[i].mode = AiMode::Wander;
                (dir * state.tuning.enemy_base_speed, dir.y.atan2(dir.x))
            }
        };

        let contained = !bounds.contains_with_margin(pos, half);
        if let Some(b) = physics.get_mut(body) {
            b.vel = vel;
            b.angle = angle;
            if contained {
                b.pos = bounds.clamp(pos, half);
                let toward_center = (bounds.center() - b.pos).normalize_or_zero();
                b.apply_force(toward_center * state.tuning.containment_nudge);
            }
        }
        state.enemies[i].wrap_hint = Some(bounds.shrink(half));
    }

    for (id, angle) in shots {
        if let Err(err) = projectile::fire(
            state,
            physics,
            Shooter::Enemy(id),
            now_ms,
            profile.shot_interval_ms,
            angle,
        ) {
            log::warn!("Enemy {} could not fire: {}", id, err);
        }
    }

    let dead: Vec<EntityId> = state
        .enemies
        .iter()
        .filter(|e| e.health <= 0)
        .map(|e| e.id)
        .collect();
    for id in dead {
        state.remove_entity(physics, id);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::ArcadePhysics;

    fn setup(enemy_pos: Vec2) -> (GameState, ArcadePhysics, EntityId) {
        let mut physics = ArcadePhysics::new();
        let mut state = GameState::new(21);
        state.spawn_tank(&mut physics, Vec2::new(400.0, 300.0));
        let enemy = state.add_enemy(&mut physics, enemy_pos, 100, 0);
        (state, physics, enemy)
    }

    #[test]
    fn test_profile_scales_with_tier() {
        let tuning = Tuning::default();
        let base = AiProfile::for_level(1, &tuning);
        assert_eq!(base.speed, 60.0);
        assert_eq!(base.shot_interval_ms, 1_500);
        assert_eq!(AiProfile::for_level(3, &tuning), base);

        let tier1 = AiProfile::for_level(4, &tuning);
        assert!((tier1.speed - 78.6).abs() < 1e-3);
        assert!((tier1.detection_radius - 266.0).abs() < 1e-3);
        assert!(tier1.shot_interval_ms < base.shot_interval_ms);
    }

    #[test]
    fn test_out_of_range_enemy_wanders() {
        // 300 px away: distance² is 90000, well beyond a 200 px radius
        let (mut state, mut physics, enemy) = setup(Vec2::new(700.0, 300.0));
        let body = state.body_of(enemy).unwrap();

        assert!(run_ai(&mut state, &mut physics, 0));
        assert_eq!(state.enemies[0].mode, AiMode::Wander);
        assert!(state.enemies[0].wander_dir.is_some());
        assert!(state.projectiles.is_empty());
        let speed = physics.get(body).unwrap().vel.length();
        assert!((speed - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_enemy_in_range_faces_and_fires() {
        let (mut state, mut physics, enemy) = setup(Vec2::new(550.0, 300.0));
        assert!(run_ai(&mut state, &mut physics, 0));

        assert_eq!(state.enemies[0].mode, AiMode::Pursue);
        let body = physics.get(state.body_of(enemy).unwrap()).unwrap();
        assert!((body.angle.abs() - std::f32::consts::PI).abs() < 1e-4);
        assert!(body.vel.x < 0.0);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].side, crate::sim::state::Side::Enemy);
    }

    #[test]
    fn test_ai_pass_is_debounced() {
        let (mut state, mut physics, _) = setup(Vec2::new(550.0, 300.0));
        assert!(run_ai(&mut state, &mut physics, 1_000));
        assert!(!run_ai(&mut state, &mut physics, 1_149));
        assert!(run_ai(&mut state, &mut physics, 1_150));
        // Still inside the 1500 ms shot interval
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_escaped_enemy_is_pulled_back() {
        let (mut state, mut physics, enemy) = setup(Vec2::new(700.0, 300.0));
        let body = state.body_of(enemy).unwrap();
        physics.get_mut(body).unwrap().pos = Vec2::new(2_000.0, -50.0);

        run_ai(&mut state, &mut physics, 0);
        let pos = physics.get(body).unwrap().pos;
        assert!(state.bounds.contains_with_margin(pos, 20.0 - 1e-3));
        assert!(state.enemies[0].wrap_hint.is_some());
    }

    #[test]
    fn test_dead_enemies_are_removed() {
        let (mut state, mut physics, enemy) = setup(Vec2::new(700.0, 300.0));
        state.enemy_mut(enemy).unwrap().health = 0;
        run_ai(&mut state, &mut physics, 0);
        assert!(state.enemies.is_empty());
        assert!(!state.contains(enemy));
    }
}
