//! Projectile spawning, movement and hit resolution
//!
//! All shots advance in one pass per tick. Each shot sweeps the segment it
//! travels this tick, so a fast projectile cannot skip over a thin wall.

use glam::Vec2;

use super::geometry::Aabb;
use super::host::Host;
use super::physics::{BodyDesc, BodyKind, PhysicsWorld};
use super::sdf::sweep_box;
use super::state::{EntityId, GameEvent, GameState, Projectile, Side};
use crate::direction_from_angle;
use crate::error::SimError;

/// Who is pulling the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shooter {
    Tank,
    Enemy(EntityId),
}

impl Shooter {
    pub fn side(&self) -> Side {
        match self {
            Shooter::Tank => Side::Player,
            Shooter::Enemy(_) => Side::Enemy,
        }
    }
}

/// What a projectile ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Tank,
    Enemy(EntityId),
    Wall(EntityId),
}

/// Fire a projectile along `angle` if the shooter's cooldown allows it.
///
/// Returns `Ok(None)` while the shooter is still cooling down.
pub fn fire(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    shooter: Shooter,
    now_ms: u64,
    min_interval_ms: u64,
    angle: f32,
) -> Result<Option<EntityId>, SimError> {
    let (shooter_id, body, last_shot) = match shooter {
        Shooter::Tank => {
            let tank = state.tank.as_ref().ok_or(SimError::MissingTank)?;
            (tank.id, tank.body, tank.last_shot_ms)
        }
        Shooter::Enemy(id) => {
            let enemy = state
                .enemies
                .iter()
                .find(|e| e.id == id)
                .ok_or(SimError::MissingBody(id))?;
            (enemy.id, enemy.body, enemy.last_shot_ms)
        }
    };

    if last_shot.is_some_and(|t| now_ms.saturating_sub(t) < min_interval_ms) {
        return Ok(None);
    }

    let (origin, shooter_half) = physics
        .get(body)
        .map(|b| (b.pos, b.half_extents.max_element()))
        .ok_or(SimError::MissingBody(shooter_id))?;

    let half = state.tuning.projectile_size / 2.0;
    let dir = direction_from_angle(angle);
    let pos = origin + dir * (shooter_half + half + state.tuning.nozzle_gap);
    let vel = dir * state.tuning.projectile_speed;

    let id = state.next_entity_id();
    let mut desc = BodyDesc::new(pos, Vec2::splat(half), BodyKind::Sensor);
    desc.angle = angle;
    let proj_body = physics.insert(desc);
    if let Some(b) = physics.get_mut(proj_body) {
        b.vel = vel;
    }

    let side = shooter.side();
    state.projectiles.push(Projectile {
        id,
        body: proj_body,
        side,
        spawned_ms: now_ms,
        vel,
        angle,
    });

    match shooter {
        Shooter::Tank => {
            if let Some(tank) = state.tank.as_mut() {
                tank.last_shot_ms = Some(now_ms);
            }
        }
        Shooter::Enemy(enemy_id) => {
            if let Some(enemy) = state.enemy_mut(enemy_id) {
                enemy.last_shot_ms = Some(now_ms);
            }
        }
    }

    state.push_event(GameEvent::ShotFired { side, at: pos });
    Ok(Some(id))
}

/// Move every projectile by `dt` seconds and resolve the first thing each
/// one touches on the way.
pub fn advance_projectiles(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &mut dyn Host,
    dt: f32,
) {
    let ids: Vec<EntityId> = state.projectiles.iter().map(|p| p.id).collect();

    for id in ids {
        let Some(proj) = state.projectiles.iter().find(|p| p.id == id).cloned() else {
            continue;
        };
        let Some(start) = physics.get(proj.body).map(|b| b.pos) else {
            log::warn!("Projectile {} lost its body, dropping it", id);
            state.remove_entity(physics, id);
            continue;
        };

        let end = start + proj.vel * dt;
        let radius = state.tuning.projectile_size / 2.0;

        match first_hit(state, physics, proj.side, start, end, radius) {
            Some((t, target)) => {
                let at = start.lerp(end, t);
                apply_hit(state, physics, host, target, at);
                state.remove_entity(physics, id);
            }
            None => {
                if let Some(body) = physics.get_mut(proj.body) {
                    body.pos = end;
                }
                if !state.arena_rect().contains(end) {
                    state.remove_entity(physics, id);
                }
            }
        }
    }
}

/// Nearest target along `start..end`, as a path fraction
fn first_hit(
    state: &GameState,
    physics: &dyn PhysicsWorld,
    side: Side,
    start: Vec2,
    end: Vec2,
    radius: f32,
) -> Option<(f32, Target)> {
    let boxed = |body| physics.get(body).map(|b| b.aabb());

    let mut candidates: Vec<(Target, Aabb)> = state
        .walls
        .iter()
        .filter_map(|w| boxed(w.body).map(|a| (Target::Wall(w.id), a)))
        .collect();

    match side {
        Side::Player => candidates.extend(
            state
                .enemies
                .iter()
                .filter(|e| e.health > 0)
                .filter_map(|e| boxed(e.body).map(|a| (Target::Enemy(e.id), a))),
        ),
        Side::Enemy => candidates.extend(
            state
                .tank
                .iter()
                .filter_map(|t| boxed(t.body).map(|a| (Target::Tank, a))),
        ),
    }

    let max_steps = state.tuning.probe_max_steps;
    candidates
        .into_iter()
        .filter_map(|(target, aabb)| {
            sweep_box(start, end, radius, &aabb, max_steps).map(|t| (t, target))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

/// Apply a projectile's damage to `target`
pub fn apply_hit(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &mut dyn Host,
    target: Target,
    at: Vec2,
) {
    match target {
        Target::Enemy(id) => {
            let damage = state.tuning.player_shot_damage;
            let Some(enemy) = state.enemy_mut(id) else {
                return;
            };
            if enemy.health <= 0 {
                return;
            }
            enemy.health -= damage;
            let health = enemy.health;
            if health <= 0 {
                // Removal happens in the next depleted sweep
                host.update_score();
                state.push_event(GameEvent::Explosion { at });
                state.push_event(GameEvent::EnemyDestroyed { id });
                log::debug!("Enemy {} destroyed", id);
            } else {
                state.push_event(GameEvent::EnemyHit { id, health });
            }
        }
        Target::Wall(id) => {
            strike_wall(state, physics, id);
        }
        Target::Tank => {
            let damage = state.tuning.enemy_shot_damage;
            let Some(tank) = state.tank.as_mut() else {
                return;
            };
            if tank.health <= 0 {
                return;
            }
            tank.health -= damage;
            let health = tank.health;
            host.set_user_health(health);
            state.push_event(GameEvent::PlayerHit { health });
            if health <= 0 {
                state.push_event(GameEvent::Explosion { at });
                state.push_event(GameEvent::PlayerDestroyed);
                host.reset_player_identity();
                log::info!("Player tank destroyed");
            }
        }
    }
}

/// Damage a wall hit by a shot. Boundary walls shrug it off. Returns true
/// when the wall was destroyed.
pub fn strike_wall(state: &mut GameState, physics: &mut dyn PhysicsWorld, id: EntityId) -> bool {
    let damage = state.tuning.wall_shot_damage;
    let Some(wall) = state.wall_mut(id) else {
        return false;
    };
    if !wall.is_destructible() {
        return false;
    }
    wall.health -= damage;
    if wall.health > 0 {
        return false;
    }
    state.remove_entity(physics, id);
    state.push_event(GameEvent::WallDestroyed { id });
    log::debug!("Wall {} destroyed", id);
    true
}
