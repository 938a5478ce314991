//! Boost pickup lifecycle
//!
//! At most one boost exists at a time. `collect_boost` is the only place a
//! collected boost leaves the world, whichever detector noticed the pickup.

use glam::Vec2;

use super::host::Host;
use super::physics::{BodyDesc, BodyKind, PhysicsWorld};
use super::state::{Boost, GameEvent, GameState};

/// Try to place a boost clear of every wall. Returns true when one was placed.
pub fn try_spawn_boost(state: &mut GameState, physics: &mut dyn PhysicsWorld) -> bool {
    if state.boost.is_some() {
        return false;
    }

    let half = state.tuning.boost_size / 2.0;
    let clearance = state.tuning.boost_wall_clearance + half;
    let walls: Vec<_> = state
        .walls
        .iter()
        .filter_map(|w| physics.get(w.body).map(|b| b.aabb()))
        .collect();

    let bounds = state.bounds;
    let attempts = state.tuning.placement_attempts;
    let found = (0..attempts).find_map(|_| {
        let candidate = bounds.random_point(&mut state.rng, half);
        walls
            .iter()
            .all(|w| w.distance_to_point(candidate) >= clearance)
            .then_some(candidate)
    });

    let Some(pos) = found else {
        log::warn!("No clear spot for a boost after {} attempts", attempts);
        return false;
    };

    let id = state.next_entity_id();
    let body = physics.insert(BodyDesc::new(pos, Vec2::splat(half), BodyKind::Sensor));
    state.boost = Some(Boost {
        id,
        body,
        spawned_ms: state.now_ms,
    });
    state.level.boost_spawned = true;
    state.push_event(GameEvent::BoostSpawned { id });
    log::debug!("Boost {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
    true
}

/// Hand the boost to the player. Safe to call twice in one tick: the second
/// call finds no boost and does nothing.
pub fn collect_boost(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    host: &mut dyn Host,
) -> bool {
    let Some(boost) = state.boost.as_ref() else {
        return false;
    };
    let Some(tank) = state.tank.as_ref() else {
        return false;
    };
    let id = boost.id;

    host.on_boost_collected(tank);
    state.remove_entity(physics, id);
    state.level.boost_spawned = false;
    state.push_event(GameEvent::BoostCollected);
    log::debug!("Boost {} collected", id);
    true
}

/// Retire a boost that outlived its lifetime. The level never spawns
/// another one afterwards.
pub fn expire_boost_if_stale(
    state: &mut GameState,
    physics: &mut dyn PhysicsWorld,
    now_ms: u64,
) -> bool {
    let Some(boost) = state.boost.as_ref() else {
        return false;
    };
    if boost.age_ms(now_ms) <= state.tuning.boost_lifetime_ms {
        return false;
    }

    let id = boost.id;
    state.remove_entity(physics, id);
    state.level.permanently_removed = true;
    state.push_event(GameEvent::BoostExpired);
    log::debug!("Boost {} expired", id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::{Aabb, ArenaSize};
    use crate::sim::host::LocalHost;
    use crate::sim::physics::ArcadePhysics;
    use crate::sim::state::WallKind;

    fn setup() -> (GameState, ArcadePhysics, LocalHost) {
        let mut physics = ArcadePhysics::new();
        let mut state = GameState::new(9);
        state.level.generated = true;
        state.spawn_tank(&mut physics, Vec2::new(100.0, 100.0));
        let host = LocalHost::new(ArenaSize::default(), 100);
        (state, physics, host)
    }

    #[test]
    fn test_spawned_boost_keeps_clear_of_walls() {
        let (mut state, mut physics, _) = setup();
        let wall = Aabb::new(Vec2::new(400.0, 300.0), Vec2::new(45.0, 10.0));
        state.add_wall(&mut physics, wall, WallKind::Obstacle, 100, 0);

        for _ in 0..20 {
            if try_spawn_boost(&mut state, &mut physics) {
                let boost = state.boost.as_ref().unwrap();
                let pos = physics.get(boost.body).unwrap().pos;
                assert!(wall.distance_to_point(pos) >= 40.0 + 15.0);
                assert!(state.level.boost_spawned);
                return;
            }
        }
        panic!("boost never spawned in an open arena");
    }

    #[test]
    fn test_only_one_boost_at_a_time() {
        let (mut state, mut physics, _) = setup();
        assert!(try_spawn_boost(&mut state, &mut physics));
        assert!(!try_spawn_boost(&mut state, &mut physics));
    }

    #[test]
    fn test_collect_twice_rewards_once() {
        let (mut state, mut physics, mut host) = setup();
        host.health = 50;
        assert!(try_spawn_boost(&mut state, &mut physics));
        let bodies = physics.len();

        assert!(collect_boost(&mut state, &mut physics, &mut host));
        assert!(!collect_boost(&mut state, &mut physics, &mut host));

        assert_eq!(host.boosts_collected, 1);
        assert_eq!(host.health, 70);
        assert_eq!(physics.len(), bodies - 1);
        assert!(!state.level.boost_spawned);
        let collected = state
            .events
            .iter()
            .filter(|e| **e == GameEvent::BoostCollected)
            .count();
        assert_eq!(collected, 1);
    }

    #[test]
    fn test_expiry_marks_level_permanently() {
        let (mut state, mut physics, _) = setup();
        state.now_ms = 1_000;
        assert!(try_spawn_boost(&mut state, &mut physics));

        assert!(!expire_boost_if_stale(&mut state, &mut physics, 21_000));
        assert!(expire_boost_if_stale(&mut state, &mut physics, 21_001));
        assert!(state.boost.is_none());
        assert!(state.level.permanently_removed);
        assert!(state.level.boost_spawned);
        assert!(!state.level.boost_allowed());
    }
}
