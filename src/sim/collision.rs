//! Post-physics collision resolution
//!
//! The physics world reports contacts but knows nothing about the game rules.
//! This pass applies them: tanks bounce off walls, stray shots chip walls,
//! the tank picks up the boost. Every path here tolerates entities that an
//! earlier pass already removed.

use glam::Vec2;

use super::boost::collect_boost;
use super::geometry::Aabb;
use super::host::Host;
use super::physics::{BodyHandle, PhysicsWorld};
use super::projectile::strike_wall;
use super::sdf::{sd_box, sdf_gradient};
use super::state::{EntityId, EntityKind, GameState};

/// Bounce slop: boxes this close count as touching
const CONTACT_SLOP: f32 = 1.0;

/// Counts of what a resolver pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub culled: usize,
    pub bounces: usize,
    pub wall_strikes: usize,
    pub boost_collected: bool,
}

/// Full resolver pass over the current registry
pub fn resolve(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &mut dyn Host,
) -> ResolveSummary {
    let mut summary = ResolveSummary {
        culled: cull_out_of_bounds(state, physics),
        ..ResolveSummary::default()
    };

    let walls = wall_boxes(state, physics);

    // Tank and enemies bounce off walls
    let movers: Vec<BodyHandle> = state
        .tank
        .iter()
        .map(|t| t.body)
        .chain(state.enemies.iter().map(|e| e.body))
        .collect();
    for body in movers {
        let Some(b) = physics.get_mut(body) else {
            continue;
        };
        let hull = b.aabb();
        let vel = b.vel;
        if walls
            .iter()
            .filter(|(_, w)| hull.overlaps_with_slop(w, CONTACT_SLOP))
            .any(|(_, w)| approaching(hull.center, vel, w))
        {
            b.vel = -b.vel;
            summary.bounces += 1;
        }
    }

    // Shots the swept probe missed
    let shots: Vec<(EntityId, Aabb)> = state
        .projectiles
        .iter()
        .filter_map(|p| physics.get(p.body).map(|b| (p.id, b.aabb())))
        .collect();
    for (shot, hull) in shots {
        let Some((wall, _)) = walls.iter().find(|(_, w)| hull.overlaps(w)) else {
            continue;
        };
        strike_wall(state, physics, *wall);
        state.remove_entity(physics, shot);
        summary.wall_strikes += 1;
    }

    if boost_touches_tank(state, physics) {
        summary.boost_collected = collect_boost(state, physics, host);
    }

    summary
}

/// React to the physics world's collision-start pairs. Only tank/boost
/// pairs matter; everything else is handled by the overlap pass.
pub fn handle_collision_starts(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &mut dyn Host,
    pairs: &[(BodyHandle, BodyHandle)],
) -> bool {
    let mut collected = false;
    for (a, b) in pairs {
        let kinds = (
            state.entity_for_body(*a).map(|(_, k)| k),
            state.entity_for_body(*b).map(|(_, k)| k),
        );
        let is_pickup = matches!(
            kinds,
            (Some(EntityKind::Tank), Some(EntityKind::Boost))
                | (Some(EntityKind::Boost), Some(EntityKind::Tank))
        );
        if is_pickup {
            collected |= collect_boost(state, physics, host);
        }
    }
    collected
}

/// Remove projectiles that left the arena rectangle
pub fn cull_out_of_bounds(state: &mut GameState, physics: &mut dyn PhysicsWorld) -> usize {
    let rect = state.arena_rect();
    let stray: Vec<EntityId> = state
        .projectiles
        .iter()
        .filter(|p| physics.get(p.body).is_none_or(|b| !rect.contains(b.pos)))
        .map(|p| p.id)
        .collect();
    stray
        .into_iter()
        .filter(|id| state.remove_entity(physics, *id))
        .count()
}

/// Keep the tank inside the playable bounds and push the tank and every
/// enemy out of any wall they sank into.
pub fn contain_and_separate(state: &mut GameState, physics: &mut dyn PhysicsWorld) {
    let walls = wall_boxes(state, physics);
    let bounds = state.bounds;

    if let Some(b) = state.tank.as_ref().and_then(|t| physics.get_mut(t.body)) {
        let margin = b.half_extents.max_element();
        b.pos = bounds.clamp(b.pos, margin);
    }

    let movers: Vec<BodyHandle> = state
        .tank
        .iter()
        .map(|t| t.body)
        .chain(state.enemies.iter().map(|e| e.body))
        .collect();
    for body in movers {
        let Some(b) = physics.get_mut(body) else {
            continue;
        };
        for (_, wall) in &walls {
            if let Some(push) = b.aabb().separation_from(wall) {
                b.pos += push;
            }
        }
    }
}

fn wall_boxes(state: &GameState, physics: &dyn PhysicsWorld) -> Vec<(EntityId, Aabb)> {
    state
        .walls
        .iter()
        .filter_map(|w| physics.get(w.body).map(|b| (w.id, b.aabb())))
        .collect()
}

/// Whether a mover at `center` is heading into `wall`. Sliding along or
/// backing away from a wall it already touches is not a hit.
fn approaching(center: Vec2, vel: Vec2, wall: &Aabb) -> bool {
    let normal = sdf_gradient(center, |p| sd_box(p, wall));
    vel.dot(normal) < 0.0
}

fn boost_touches_tank(state: &GameState, physics: &dyn PhysicsWorld) -> bool {
    let (Some(tank), Some(boost)) = (state.tank.as_ref(), state.boost.as_ref()) else {
        return false;
    };
    match (physics.get(tank.body), physics.get(boost.body)) {
        (Some(t), Some(b)) => t.aabb().overlaps(&b.aabb()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boost::try_spawn_boost;
    use crate::sim::geometry::ArenaSize;
    use crate::sim::host::LocalHost;
    use crate::sim::physics::ArcadePhysics;
    use crate::sim::projectile::{Shooter, fire};
    use crate::sim::state::{GameEvent, WallKind};

    fn setup() -> (GameState, ArcadePhysics, LocalHost) {
        let mut physics = ArcadePhysics::new();
        let mut state = GameState::new(13);
        state.level.generated = true;
        state.spawn_tank(&mut physics, Vec2::new(100.0, 300.0));
        (state, physics, LocalHost::new(ArenaSize::default(), 100))
    }

    fn place_boost_on_tank(state: &mut GameState, physics: &mut ArcadePhysics) {
        assert!(try_spawn_boost(state, physics));
        let body = state.boost.as_ref().unwrap().body;
        physics.get_mut(body).unwrap().pos = Vec2::new(100.0, 300.0);
    }

    #[test]
    fn test_tank_bounces_off_wall() {
        let (mut state, mut physics, mut host) = setup();
        state.add_wall(
            &mut physics,
            Aabb::new(Vec2::new(130.0, 300.0), Vec2::new(10.0, 45.0)),
            WallKind::Obstacle,
            100,
            0,
        );
        let body = state.tank.as_ref().unwrap().body;
        physics.get_mut(body).unwrap().vel = Vec2::new(150.0, 20.0);

        let summary = resolve(&mut state, &mut physics, &mut host);
        assert_eq!(summary.bounces, 1);
        assert_eq!(physics.get(body).unwrap().vel, Vec2::new(-150.0, -20.0));
    }

    #[test]
    fn test_no_bounce_when_leaving_or_sliding_along_wall() {
        let (mut state, mut physics, mut host) = setup();
        state.add_wall(
            &mut physics,
            Aabb::new(Vec2::new(130.0, 300.0), Vec2::new(10.0, 45.0)),
            WallKind::Obstacle,
            100,
            0,
        );
        let body = state.tank.as_ref().unwrap().body;

        physics.get_mut(body).unwrap().vel = Vec2::new(-150.0, 0.0);
        assert_eq!(resolve(&mut state, &mut physics, &mut host).bounces, 0);
        assert_eq!(physics.get(body).unwrap().vel, Vec2::new(-150.0, 0.0));

        physics.get_mut(body).unwrap().vel = Vec2::new(0.0, 150.0);
        assert_eq!(resolve(&mut state, &mut physics, &mut host).bounces, 0);
        assert_eq!(physics.get(body).unwrap().vel, Vec2::new(0.0, 150.0));
    }

    #[test]
    fn test_both_boost_paths_collect_once() {
        let (mut state, mut physics, mut host) = setup();
        place_boost_on_tank(&mut state, &mut physics);
        physics.step(0.0);
        let pairs = physics.drain_collision_starts();

        assert!(handle_collision_starts(&mut state, &mut physics, &mut host, &pairs));
        let summary = resolve(&mut state, &mut physics, &mut host);

        assert!(!summary.boost_collected);
        assert_eq!(host.boosts_collected, 1);
        assert!(state.boost.is_none());
        // Only the tank's body is left
        assert_eq!(physics.len(), 1);
        let collected = state
            .events
            .iter()
            .filter(|e| **e == GameEvent::BoostCollected)
            .count();
        assert_eq!(collected, 1);
    }

    #[test]
    fn test_overlap_path_removes_boost_body() {
        let (mut state, mut physics, mut host) = setup();
        place_boost_on_tank(&mut state, &mut physics);

        let summary = resolve(&mut state, &mut physics, &mut host);
        assert!(summary.boost_collected);
        assert_eq!(physics.len(), 1);
    }

    #[test]
    fn test_shot_overlapping_wall_strikes_it() {
        let (mut state, mut physics, mut host) = setup();
        let wall = state.add_wall(
            &mut physics,
            Aabb::new(Vec2::new(400.0, 300.0), Vec2::new(10.0, 45.0)),
            WallKind::Obstacle,
            50,
            0,
        );
        let shot = fire(&mut state, &mut physics, Shooter::Tank, 0, 300, 0.0)
            .unwrap()
            .unwrap();
        let body = state.body_of(shot).unwrap();
        physics.get_mut(body).unwrap().pos = Vec2::new(395.0, 300.0);

        let summary = resolve(&mut state, &mut physics, &mut host);
        assert_eq!(summary.wall_strikes, 1);
        assert!(!state.contains(shot));
        assert!(!state.contains(wall));
        assert!(state.events.contains(&GameEvent::WallDestroyed { id: wall }));
    }

    #[test]
    fn test_cull_is_idempotent() {
        let (mut state, mut physics, _) = setup();
        let shot = fire(&mut state, &mut physics, Shooter::Tank, 0, 300, 0.0)
            .unwrap()
            .unwrap();
        let body = state.body_of(shot).unwrap();
        physics.get_mut(body).unwrap().pos = Vec2::new(-10.0, 300.0);

        assert_eq!(cull_out_of_bounds(&mut state, &mut physics), 1);
        assert_eq!(cull_out_of_bounds(&mut state, &mut physics), 0);
    }

    #[test]
    fn test_separation_pushes_enemy_out_of_wall() {
        let (mut state, mut physics, _) = setup();
        let wall = Aabb::new(Vec2::new(400.0, 300.0), Vec2::new(45.0, 10.0));
        state.add_wall(&mut physics, wall, WallKind::Obstacle, 100, 0);
        let enemy = state.add_enemy(&mut physics, Vec2::new(400.0, 325.0), 100, 0);

        contain_and_separate(&mut state, &mut physics);
        let pos = physics.get(state.body_of(enemy).unwrap()).unwrap().pos;
        let hull = Aabb::new(pos, Vec2::splat(20.0));
        assert!(hull.separation_from(&wall).is_none());
        assert!(pos.y > 325.0);
    }

    #[test]
    fn test_tank_is_clamped_into_bounds() {
        let (mut state, mut physics, _) = setup();
        let body = state.tank.as_ref().unwrap().body;
        physics.get_mut(body).unwrap().pos = Vec2::new(-300.0, 900.0);

        contain_and_separate(&mut state, &mut physics);
        assert_eq!(physics.get(body).unwrap().pos, Vec2::new(40.0, 560.0));
    }
}
