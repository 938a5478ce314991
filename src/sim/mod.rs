//! Per-tick simulation core
//!
//! Everything that runs inside one frame lives here:
//! - Seeded RNG only, so a run replays from its seed
//! - Stable iteration order (spawn order within each collection)
//! - Physics and host side effects go through the `PhysicsWorld` and `Host` traits

pub mod ai;
pub mod boost;
pub mod collision;
pub mod geometry;
pub mod host;
pub mod physics;
pub mod projectile;
pub mod sdf;
pub mod spawner;
pub mod state;
pub mod tick;

pub use geometry::{Aabb, ArenaSize, Bounds};
pub use host::{ControlIntent, Host, LocalHost, ShootIntent};
pub use physics::{ArcadePhysics, BodyHandle, BodyKind, PhysicsWorld};
pub use state::{
    AiMode, Boost, Enemy, EntityId, EntityKind, GameEvent, GameState, LevelState, Projectile,
    Side, Tank, Wall, WallKind,
};
pub use tick::{TickReport, tick};
