//! Game state and core simulation types
//!
//! `GameState` is the entity registry for one run. Each subsystem borrows it
//! exclusively for the duration of a tick; nothing keeps a reference across
//! ticks. Entities only hold a `BodyHandle` into the physics world, which owns
//! the rigid-body memory.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, ArenaSize, Bounds};
use super::physics::{BodyDesc, BodyHandle, BodyKind, PhysicsWorld};
use crate::audio::SoundEffect;
use crate::error::SimError;
use crate::tuning::Tuning;

/// Stable identifier of an entity within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity category discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Tank,
    Enemy,
    Wall,
    Projectile,
    Boost,
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

/// The player's tank
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: EntityId,
    pub body: BodyHandle,
    pub health: i32,
    pub last_shot_ms: Option<u64>,
}

impl Tank {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Enemy behaviour chosen by the last AI pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    /// Tank out of detection range: drift along a random heading
    #[default]
    Wander,
    /// Tank in range: face it, close in, shoot
    Pursue,
}

/// An AI-controlled tank
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub body: BodyHandle,
    /// Spawn index within its level (`enemy_<slot>`)
    pub slot: usize,
    pub health: i32,
    pub mode: AiMode,
    pub last_shot_ms: Option<u64>,
    pub wander_dir: Option<Vec2>,
    pub last_dir_change_ms: u64,
    /// Bounds the renderer may wrap this enemy within (cosmetic)
    pub wrap_hint: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallKind {
    /// Arena edge. Carries health but never takes damage.
    Boundary,
    /// Interior obstacle, destroyed by gunfire
    Obstacle,
}

#[derive(Debug, Clone)]
pub struct Wall {
    pub id: EntityId,
    pub body: BodyHandle,
    pub kind: WallKind,
    pub slot: usize,
    pub health: i32,
}

impl Wall {
    pub fn is_destructible(&self) -> bool {
        self.kind == WallKind::Obstacle
    }
}

/// A shot in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub body: BodyHandle,
    pub side: Side,
    pub spawned_ms: u64,
    /// Pixels per second
    pub vel: Vec2,
    /// Firing angle (radians)
    pub angle: f32,
}

/// A temporary pickup (trigger volume)
#[derive(Debug, Clone)]
pub struct Boost {
    pub id: EntityId,
    pub body: BodyHandle,
    pub spawned_ms: u64,
}

impl Boost {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.spawned_ms)
    }
}

/// Per-level progression flags, owned and persisted by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    pub level: u32,
    pub generated: bool,
    #[serde(rename = "boostSpawned", default)]
    pub boost_spawned: bool,
    #[serde(rename = "permanentRemoved", default)]
    pub permanently_removed: bool,
}

impl Default for LevelState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LevelState {
    /// Fresh, not-yet-generated state for `level`
    pub fn new(level: u32) -> Self {
        Self {
            level,
            generated: false,
            boost_spawned: false,
            permanently_removed: false,
        }
    }

    /// Whether a boost may be placed this tick
    pub fn boost_allowed(&self) -> bool {
        self.generated && !self.boost_spawned && !self.permanently_removed
    }
}

/// Semantic things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ShotFired { side: Side, at: Vec2 },
    Explosion { at: Vec2 },
    EnemyHit { id: EntityId, health: i32 },
    EnemyDestroyed { id: EntityId },
    WallDestroyed { id: EntityId },
    PlayerHit { health: i32 },
    PlayerDestroyed,
    BoostSpawned { id: EntityId },
    BoostCollected,
    BoostExpired,
    LevelGenerated { level: u32, enemies: usize, walls: usize },
    LevelWon { level: u32 },
}

impl GameEvent {
    /// Sound the host should play for this event, if any
    pub fn sound(&self) -> Option<SoundEffect> {
        match self {
            GameEvent::ShotFired { .. } => Some(SoundEffect::Shot),
            GameEvent::Explosion { .. } => Some(SoundEffect::Explosion),
            GameEvent::EnemyHit { .. } | GameEvent::PlayerHit { .. } => Some(SoundEffect::Collision),
            GameEvent::BoostCollected => Some(SoundEffect::Bonus),
            GameEvent::LevelWon { .. } => Some(SoundEffect::Win),
            GameEvent::PlayerDestroyed => Some(SoundEffect::Lose),
            _ => None,
        }
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub arena: ArenaSize,
    pub bounds: Bounds,
    /// Host's level flags as of the current tick
    pub level: LevelState,
    /// Monotonic tick time (ms)
    pub now_ms: u64,
    pub last_tick_ms: Option<u64>,
    /// Time of the last enemy AI evaluation
    pub last_ai_ms: Option<u64>,
    /// Set once `on_win` has fired for the current level
    pub win_reported: bool,
    pub tank: Option<Tank>,
    /// Sorted by spawn order
    pub enemies: Vec<Enemy>,
    pub walls: Vec<Wall>,
    pub projectiles: Vec<Projectile>,
    pub boost: Option<Boost>,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let arena = ArenaSize::default();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds: Bounds::from_arena(arena, tuning.bounds_margin),
            tuning,
            arena,
            level: LevelState::default(),
            now_ms: 0,
            last_tick_ms: None,
            last_ai_ms: None,
            win_reported: false,
            tank: None,
            enemies: Vec::new(),
            walls: Vec::new(),
            projectiles: Vec::new(),
            boost: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Resize the arena and recompute the playable bounds
    pub fn set_arena(&mut self, arena: ArenaSize) {
        self.arena = arena;
        self.bounds = Bounds::from_arena(arena, self.tuning.bounds_margin);
    }

    /// The full viewport rectangle, without the playable-bounds inset
    pub fn arena_rect(&self) -> Bounds {
        Bounds::from_arena(self.arena, 0.0)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    // --- Spawning into the registry ---

    /// Register the player tank, replacing any previous one
    pub fn spawn_tank(&mut self, physics: &mut dyn PhysicsWorld, pos: Vec2) -> EntityId {
        if let Some(old) = self.tank.take() {
            physics.remove(old.body);
        }
        let id = self.next_entity_id();
        let half = Vec2::splat(self.tuning.tank_size / 2.0);
        let body = physics.insert(BodyDesc::new(pos, half, BodyKind::Dynamic));
        self.tank = Some(Tank {
            id,
            body,
            health: self.tuning.tank_max_health,
            last_shot_ms: None,
        });
        id
    }

    pub fn add_enemy(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        pos: Vec2,
        health: i32,
        slot: usize,
    ) -> EntityId {
        let id = self.next_entity_id();
        let half = Vec2::splat(self.tuning.enemy_size / 2.0);
        let body = physics.insert(BodyDesc::new(pos, half, BodyKind::Dynamic));
        self.enemies.push(Enemy {
            id,
            body,
            slot,
            health,
            mode: AiMode::Wander,
            last_shot_ms: None,
            wander_dir: None,
            last_dir_change_ms: self.now_ms,
            wrap_hint: None,
        });
        id
    }

    pub fn add_wall(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        shape: Aabb,
        kind: WallKind,
        health: i32,
        slot: usize,
    ) -> EntityId {
        let id = self.next_entity_id();
        let body = physics.insert(BodyDesc::new(shape.center, shape.half, BodyKind::Static));
        self.walls.push(Wall {
            id,
            body,
            kind,
            slot,
            health,
        });
        id
    }

    // --- Lookups ---

    pub fn entity_kind(&self, id: EntityId) -> Option<EntityKind> {
        if self.tank.as_ref().is_some_and(|t| t.id == id) {
            Some(EntityKind::Tank)
        } else if self.enemies.iter().any(|e| e.id == id) {
            Some(EntityKind::Enemy)
        } else if self.walls.iter().any(|w| w.id == id) {
            Some(EntityKind::Wall)
        } else if self.projectiles.iter().any(|p| p.id == id) {
            Some(EntityKind::Projectile)
        } else if self.boost.as_ref().is_some_and(|b| b.id == id) {
            Some(EntityKind::Boost)
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entity_kind(id).is_some()
    }

    /// Physics body backing an entity
    pub fn body_of(&self, id: EntityId) -> Option<BodyHandle> {
        self.tank
            .iter()
            .filter(|t| t.id == id)
            .map(|t| t.body)
            .chain(self.enemies.iter().filter(|e| e.id == id).map(|e| e.body))
            .chain(self.walls.iter().filter(|w| w.id == id).map(|w| w.body))
            .chain(self.projectiles.iter().filter(|p| p.id == id).map(|p| p.body))
            .chain(self.boost.iter().filter(|b| b.id == id).map(|b| b.body))
            .next()
    }

    /// Reverse lookup from a physics body to the entity that owns it
    pub fn entity_for_body(&self, body: BodyHandle) -> Option<(EntityId, EntityKind)> {
        if let Some(t) = self.tank.as_ref().filter(|t| t.body == body) {
            return Some((t.id, EntityKind::Tank));
        }
        if let Some(b) = self.boost.as_ref().filter(|b| b.body == body) {
            return Some((b.id, EntityKind::Boost));
        }
        self.enemies
            .iter()
            .find(|e| e.body == body)
            .map(|e| (e.id, EntityKind::Enemy))
            .or_else(|| {
                self.walls
                    .iter()
                    .find(|w| w.body == body)
                    .map(|w| (w.id, EntityKind::Wall))
            })
            .or_else(|| {
                self.projectiles
                    .iter()
                    .find(|p| p.body == body)
                    .map(|p| (p.id, EntityKind::Projectile))
            })
    }

    /// Namespaced registry key, as used by string-keyed renderers
    pub fn entity_key(&self, id: EntityId) -> Option<String> {
        if self.tank.as_ref().is_some_and(|t| t.id == id) {
            return Some("tank".to_string());
        }
        if self.boost.as_ref().is_some_and(|b| b.id == id) {
            return Some("boost".to_string());
        }
        if let Some(e) = self.enemies.iter().find(|e| e.id == id) {
            return Some(format!("enemy_{}", e.slot));
        }
        if let Some(w) = self.walls.iter().find(|w| w.id == id) {
            return Some(match w.kind {
                WallKind::Boundary => format!("wall_{}", w.slot),
                WallKind::Obstacle => format!("random_wall_{}", w.slot),
            });
        }
        self.projectiles.iter().find(|p| p.id == id).map(|p| match p.side {
            Side::Player => format!("bullet_{}_{}", p.spawned_ms, p.id.0),
            Side::Enemy => format!("enemyShot_{}_{}", p.spawned_ms, p.id.0),
        })
    }

    /// Every live entity id, tank first
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.tank
            .iter()
            .map(|t| t.id)
            .chain(self.enemies.iter().map(|e| e.id))
            .chain(self.walls.iter().map(|w| w.id))
            .chain(self.projectiles.iter().map(|p| p.id))
            .chain(self.boost.iter().map(|b| b.id))
            .collect()
    }

    /// Every live registry key
    pub fn registry_keys(&self) -> Vec<String> {
        self.entity_ids()
            .into_iter()
            .filter_map(|id| self.entity_key(id))
            .collect()
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn wall_mut(&mut self, id: EntityId) -> Option<&mut Wall> {
        self.walls.iter_mut().find(|w| w.id == id)
    }

    /// Current position of an entity's body
    pub fn position_of(&self, physics: &dyn PhysicsWorld, id: EntityId) -> Result<Vec2, SimError> {
        self.body_of(id)
            .and_then(|body| physics.get(body))
            .map(|b| b.pos)
            .ok_or(SimError::MissingBody(id))
    }

    pub fn tank_position(&self, physics: &dyn PhysicsWorld) -> Result<Vec2, SimError> {
        let tank = self.tank.as_ref().ok_or(SimError::MissingTank)?;
        physics
            .get(tank.body)
            .map(|b| b.pos)
            .ok_or(SimError::MissingBody(tank.id))
    }

    /// Enemies still standing
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.health > 0).count()
    }

    /// True when no enemy has health left (including when there are none)
    pub fn check_all_enemies_defeated(&self) -> bool {
        self.live_enemy_count() == 0
    }

    // --- Removal ---

    /// Remove an entity from the registry and its body from the physics
    /// world in one go. Removing an absent id is a no-op returning false.
    pub fn remove_entity(&mut self, physics: &mut dyn PhysicsWorld, id: EntityId) -> bool {
        let body = if self.tank.as_ref().is_some_and(|t| t.id == id) {
            self.tank.take().map(|t| t.body)
        } else if self.boost.as_ref().is_some_and(|b| b.id == id) {
            self.boost.take().map(|b| b.body)
        } else if let Some(i) = self.enemies.iter().position(|e| e.id == id) {
            Some(self.enemies.remove(i).body)
        } else if let Some(i) = self.walls.iter().position(|w| w.id == id) {
            Some(self.walls.remove(i).body)
        } else if let Some(i) = self.projectiles.iter().position(|p| p.id == id) {
            Some(self.projectiles.remove(i).body)
        } else {
            None
        };

        match body {
            Some(body) => {
                physics.remove(body);
                true
            }
            None => false,
        }
    }

    /// Batch-remove every enemy and wall at or below zero health
    pub fn remove_depleted(&mut self, physics: &mut dyn PhysicsWorld) -> usize {
        let depleted: Vec<EntityId> = self
            .enemies
            .iter()
            .filter(|e| e.health <= 0)
            .map(|e| e.id)
            .chain(
                self.walls
                    .iter()
                    .filter(|w| w.health <= 0)
                    .map(|w| w.id),
            )
            .collect();
        depleted
            .into_iter()
            .filter(|id| self.remove_entity(physics, *id))
            .count()
    }

    /// Drop registry entries whose physics body has disappeared
    pub fn reconcile(&mut self, physics: &dyn PhysicsWorld) -> usize {
        let before = self.enemies.len() + self.walls.len() + self.projectiles.len();
        self.enemies.retain(|e| physics.contains(e.body));
        self.walls.retain(|w| physics.contains(w.body));
        self.projectiles.retain(|p| physics.contains(p.body));
        let mut dropped = before - (self.enemies.len() + self.walls.len() + self.projectiles.len());
        if self.boost.as_ref().is_some_and(|b| !physics.contains(b.body)) {
            self.boost = None;
            dropped += 1;
        }
        if dropped > 0 {
            log::warn!("Dropped {} registry entries with no physics body", dropped);
        }
        dropped
    }

    /// Remove all level-scoped entities (enemies, walls, shots, boost)
    pub fn clear_level(&mut self, physics: &mut dyn PhysicsWorld) {
        let ids: Vec<EntityId> = self
            .entity_ids()
            .into_iter()
            .filter(|id| self.entity_kind(*id) != Some(EntityKind::Tank))
            .collect();
        for id in ids {
            self.remove_entity(physics, id);
        }
    }
}
