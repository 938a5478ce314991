//! Tank Arena - a tank-versus-AI arena arcade game
//!
//! Core modules:
//! - `sim`: Per-tick simulation (spawning, AI, projectiles, collisions)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `persistence`: Key/value store collaborator and saved records
//! - `highscores`: Leaderboard
//! - `audio`: Sound effect vocabulary and native playback bookkeeping

pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, PersistenceError, SimError};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the physics step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Fallback arena used when the host reports unusable dimensions
    pub const DEFAULT_ARENA_WIDTH: f32 = 800.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 600.0;

    /// Points the host awards per destroyed enemy
    pub const SCORE_PER_KILL: u64 = 100;
}

/// Wrap an angle into [-π, π]. Non-finite input comes back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Unit vector pointing along `angle` (0 = +x, counter-clockwise)
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the vector from `from` to `to`
#[inline]
pub fn angle_towards(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}
