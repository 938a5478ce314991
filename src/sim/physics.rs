//! Rigid-body collaborator
//!
//! The core never integrates positions itself (apart from projectiles, which
//! it moves explicitly). It talks to a `PhysicsWorld` through handles and
//! consumes the world's collision-start pairs. `ArcadePhysics` is a small
//! reference world good enough for native runs and tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::geometry::Aabb;

/// Non-owning reference to a body inside a `PhysicsWorld`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves (walls)
    Static,
    /// Integrated by the world (tanks)
    Dynamic,
    /// Trigger volume: reports contacts, never integrated or pushed
    Sensor,
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub pos: Vec2,
    pub half_extents: Vec2,
    pub angle: f32,
    pub kind: BodyKind,
}

impl BodyDesc {
    pub fn new(pos: Vec2, half_extents: Vec2, kind: BodyKind) -> Self {
        Self {
            pos,
            half_extents,
            angle: 0.0,
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    pub angle: f32,
    pub half_extents: Vec2,
    pub kind: BodyKind,
    /// Accumulated force, cleared after each step (unit mass)
    pub force: Vec2,
}

impl Body {
    fn from_desc(desc: BodyDesc) -> Self {
        Self {
            pos: desc.pos,
            vel: Vec2::ZERO,
            angle: desc.angle,
            half_extents: desc.half_extents,
            kind: desc.kind,
            force: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.half_extents)
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }
}

/// The physics engine as seen by the simulation core
pub trait PhysicsWorld {
    fn insert(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a body. Returns false when the handle is already gone.
    fn remove(&mut self, handle: BodyHandle) -> bool;

    fn get(&self, handle: BodyHandle) -> Option<&Body>;

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body>;

    /// Advance the world by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Pairs that started touching since the last drain
    fn drain_collision_starts(&mut self) -> Vec<(BodyHandle, BodyHandle)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }
}

/// Minimal box world: unit-mass Euler integration and O(n²) contact pairs
#[derive(Debug, Default)]
pub struct ArcadePhysics {
    bodies: BTreeMap<BodyHandle, Body>,
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    collision_starts: Vec<(BodyHandle, BodyHandle)>,
    next_handle: u32,
}

impl ArcadePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    fn detect_contacts(&mut self) {
        let mut current = BTreeSet::new();
        let bodies: Vec<(BodyHandle, Aabb, BodyKind)> = self
            .bodies
            .iter()
            .map(|(h, b)| (*h, b.aabb(), b.kind))
            .collect();

        for (i, (a, a_box, a_kind)) in bodies.iter().enumerate() {
            for (b, b_box, b_kind) in &bodies[i + 1..] {
                if *a_kind == BodyKind::Static && *b_kind == BodyKind::Static {
                    continue;
                }
                if a_box.overlaps(b_box) {
                    current.insert((*a, *b));
                }
            }
        }

        for pair in current.difference(&self.touching) {
            self.collision_starts.push(*pair);
        }
        self.touching = current;
    }
}

impl PhysicsWorld for ArcadePhysics {
    fn insert(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, Body::from_desc(desc));
        handle
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        self.touching.retain(|(a, b)| *a != handle && *b != handle);
        self.collision_starts
            .retain(|(a, b)| *a != handle && *b != handle);
        true
    }

    fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(&handle)
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                body.force = Vec2::ZERO;
                continue;
            }
            body.vel += body.force * dt;
            body.force = Vec2::ZERO;
            body.pos += body.vel * dt;
        }
        self.detect_contacts();
    }

    fn drain_collision_starts(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        std::mem::take(&mut self.collision_starts)
    }

    fn len(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_bodies_integrate() {
        let mut world = ArcadePhysics::new();
        let h = world.insert(BodyDesc::new(Vec2::ZERO, Vec2::splat(5.0), BodyKind::Dynamic));
        world.get_mut(h).unwrap().vel = Vec2::new(60.0, 0.0);
        world.step(0.5);
        assert_eq!(world.get(h).unwrap().pos, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_static_and_sensor_do_not_move() {
        let mut world = ArcadePhysics::new();
        let wall = world.insert(BodyDesc::new(Vec2::ZERO, Vec2::splat(5.0), BodyKind::Static));
        let sensor = world.insert(BodyDesc::new(Vec2::ONE, Vec2::splat(5.0), BodyKind::Sensor));
        world.get_mut(wall).unwrap().vel = Vec2::new(10.0, 0.0);
        world.get_mut(sensor).unwrap().apply_force(Vec2::new(10.0, 0.0));
        world.step(1.0);
        assert_eq!(world.get(wall).unwrap().pos, Vec2::ZERO);
        assert_eq!(world.get(sensor).unwrap().pos, Vec2::ONE);
    }

    #[test]
    fn test_collision_start_reported_once() {
        let mut world = ArcadePhysics::new();
        let a = world.insert(BodyDesc::new(Vec2::ZERO, Vec2::splat(5.0), BodyKind::Dynamic));
        let b = world.insert(BodyDesc::new(Vec2::new(4.0, 0.0), Vec2::splat(5.0), BodyKind::Sensor));

        world.step(0.016);
        assert_eq!(world.drain_collision_starts(), vec![(a, b)]);

        // Still touching: not a new start
        world.step(0.016);
        assert!(world.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut world = ArcadePhysics::new();
        let h = world.insert(BodyDesc::new(Vec2::ZERO, Vec2::splat(5.0), BodyKind::Static));
        assert!(world.remove(h));
        assert!(!world.remove(h));
        assert!(world.is_empty());
    }
}
