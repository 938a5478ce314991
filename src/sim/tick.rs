//! Per-frame simulation step
//!
//! `tick` is the single entry point the host calls once per render frame.
//! A failing step is logged and skipped; it never aborts the frame.

use glam::Vec2;

use super::ai::run_ai;
use super::boost::{expire_boost_if_stale, try_spawn_boost};
use super::collision::{contain_and_separate, handle_collision_starts, resolve};
use super::host::{ControlIntent, Host, ShootIntent};
use super::physics::PhysicsWorld;
use super::projectile::{self, Shooter, advance_projectiles};
use super::spawner;
use super::state::{GameEvent, GameState, WallKind};
use crate::consts::MAX_FRAME_DT;
use crate::error::SimError;
use crate::{direction_from_angle, normalize_angle};

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// A required collaborator was missing; nothing ran
    pub skipped: bool,
    pub level_won: bool,
    pub player_defeated: bool,
    pub events: Vec<GameEvent>,
}

/// Advance the simulation to `now_ms`
pub fn tick(
    state: &mut GameState,
    physics: Option<&mut dyn PhysicsWorld>,
    host: &mut dyn Host,
    now_ms: u64,
    sound_enabled: bool,
) -> TickReport {
    let mut report = TickReport::default();

    let Some(physics) = physics else {
        log::debug!("No physics world, skipping tick");
        report.skipped = true;
        return report;
    };
    if let Err(err) = state.tank_position(physics) {
        log::debug!("Skipping tick: {}", err);
        report.skipped = true;
        return report;
    }

    let dt = state
        .last_tick_ms
        .map(|t| now_ms.saturating_sub(t) as f32 / 1000.0)
        .unwrap_or(0.0)
        .min(MAX_FRAME_DT);
    state.last_tick_ms = Some(now_ms);
    state.now_ms = now_ms;

    sync_from_host(state, host);
    let level_before = state.level;

    // Layout change: rebuild the arena edges
    if host.orientation_changed() {
        rebuild_boundary_walls(state, physics);
        host.set_orientation_changed(false);
    }

    if !state.level.generated {
        if let Err(err) = generate_level(state, physics) {
            log::warn!("Level {} generation failed: {}", state.level.level, err);
        }
    }

    if state.level.boost_allowed() {
        try_spawn_boost(state, physics);
    }
    expire_boost_if_stale(state, physics, now_ms);

    physics.step(dt);
    advance_projectiles(state, physics, host, dt);
    let pairs = physics.drain_collision_starts();
    handle_collision_starts(state, physics, host, &pairs);

    state.reconcile(physics);

    if state.level.generated && !state.win_reported && state.check_all_enemies_defeated() {
        state.win_reported = true;
        host.on_win();
        state.push_event(GameEvent::LevelWon {
            level: state.level.level,
        });
        report.level_won = true;
    }

    let depleted = state.remove_depleted(physics);
    if depleted > 0 {
        log::debug!("Removed {} depleted entities", depleted);
    }

    run_ai(state, physics, now_ms);

    if let Err(err) = apply_intents(state, physics, host, dt, now_ms) {
        log::warn!("Player input not applied: {}", err);
    }

    contain_and_separate(state, physics);
    resolve(state, physics, host);

    if state.level != level_before {
        host.set_current_level(state.level);
    }

    report.events = std::mem::take(&mut state.events);
    report.player_defeated = report.events.contains(&GameEvent::PlayerDestroyed);
    if sound_enabled {
        for sound in report.events.iter().filter_map(GameEvent::sound) {
            host.play_sound(sound);
        }
    }
    report
}

/// Pull arena size, tank health and level flags from the host
fn sync_from_host(state: &mut GameState, host: &dyn Host) {
    let screen = host.screen_dimension();
    if screen.is_valid() {
        if screen != state.arena {
            state.set_arena(screen);
        }
    } else {
        let err = SimError::InvalidArena {
            width: screen.width,
            height: screen.height,
        };
        log::warn!("{}; keeping {}x{}", err, state.arena.width, state.arena.height);
    }

    if let Some(tank) = state.tank.as_mut() {
        tank.health = host.user_health();
    }
    state.level = host.current_level();
}

/// Spawn the enemies and walls for the current level
fn generate_level(state: &mut GameState, physics: &mut dyn PhysicsWorld) -> Result<(), SimError> {
    state.clear_level(physics);
    let tank_pos = state.tank_position(physics)?;

    let plan = spawner::spawn_level(
        state.level.level,
        state.arena,
        tank_pos,
        None,
        &state.tuning,
        &mut state.rng,
    );

    for (slot, enemy) in plan.enemies.iter().enumerate() {
        state.add_enemy(physics, enemy.pos, enemy.health, slot);
    }
    let (mut boundary_slot, mut obstacle_slot) = (0, 0);
    for wall in &plan.walls {
        let slot = match wall.kind {
            WallKind::Boundary => &mut boundary_slot,
            WallKind::Obstacle => &mut obstacle_slot,
        };
        state.add_wall(physics, wall.shape, wall.kind, wall.health, *slot);
        *slot += 1;
    }

    state.level.generated = true;
    state.level.boost_spawned = false;
    state.win_reported = false;
    state.last_ai_ms = None;
    state.push_event(GameEvent::LevelGenerated {
        level: state.level.level,
        enemies: plan.enemies.len(),
        walls: plan.walls.len(),
    });
    Ok(())
}

/// Swap the four edge walls for ones matching the current arena
fn rebuild_boundary_walls(state: &mut GameState, physics: &mut dyn PhysicsWorld) {
    let old: Vec<_> = state
        .walls
        .iter()
        .filter(|w| w.kind == WallKind::Boundary)
        .map(|w| w.id)
        .collect();
    for id in old {
        state.remove_entity(physics, id);
    }

    for (slot, wall) in spawner::boundary_walls(state.arena, &state.tuning)
        .into_iter()
        .enumerate()
    {
        state.add_wall(physics, wall.shape, wall.kind, wall.health, slot);
    }
    log::info!(
        "Boundary walls rebuilt for {}x{}",
        state.arena.width,
        state.arena.height
    );
}

/// Drive the tank from the host's movement and shoot intents
fn apply_intents(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &dyn Host,
    dt: f32,
    now_ms: u64,
) -> Result<(), SimError> {
    let tank = state.tank.as_ref().ok_or(SimError::MissingTank)?;
    let id = tank.id;
    let speed = state.tuning.tank_speed;
    let turn = state.tuning.tank_turn_speed * dt;
    let body = physics
        .get_mut(tank.body)
        .ok_or(SimError::MissingBody(id))?;

    match host.control_intent() {
        Some(ControlIntent::Move { angle }) if !angle.is_finite() => {
            log::warn!("Ignoring move toward non-finite angle {}", angle);
            body.vel = Vec2::ZERO;
        }
        Some(ControlIntent::Move { angle }) => {
            body.angle = normalize_angle(angle);
            body.vel = direction_from_angle(body.angle) * speed;
        }
        Some(ControlIntent::MoveForward) => {
            body.vel = direction_from_angle(body.angle) * speed;
        }
        Some(ControlIntent::MoveBackward) => {
            body.vel = -direction_from_angle(body.angle) * speed;
        }
        Some(ControlIntent::MoveLeft) => {
            body.angle = normalize_angle(body.angle - turn);
            body.vel = direction_from_angle(body.angle) * speed;
        }
        Some(ControlIntent::MoveRight) => {
            body.angle = normalize_angle(body.angle + turn);
            body.vel = direction_from_angle(body.angle) * speed;
        }
        None => body.vel = Vec2::ZERO,
    }
    let facing = body.angle;

    if host.shoot_intent() == Some(ShootIntent::CreateBullet) {
        let interval = state.tuning.player_fire_interval_ms;
        projectile::fire(state, physics, Shooter::Tank, now_ms, interval, facing)?;
    }
    Ok(())
}
