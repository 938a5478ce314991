//! Data-driven game balance
//!
//! Every number the simulation core consults lives here so a host can ship a
//! JSON override without rebuilding. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A fraction of the arena's shorter side that shrinks as levels advance.
///
/// `start` applies at level 1 and drops by `step` every `levels_per_step`
/// levels, never going below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceScale {
    pub start: f32,
    pub step: f32,
    pub levels_per_step: u32,
    pub floor: f32,
}

impl DistanceScale {
    /// Fraction in effect for `level` (1-based)
    pub fn fraction(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) / self.levels_per_step.max(1);
        (self.start - self.step * steps as f32).max(self.floor)
    }

    /// Distance in pixels for `level` given the arena's shorter side
    pub fn distance(&self, level: u32, shorter_side: f32) -> f32 {
        self.fraction(level) * shorter_side
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    /// Inset between the viewport edge and the playable bounds
    pub bounds_margin: f32,
    /// Thickness of the four boundary walls
    pub wall_thickness: f32,

    // === Player tank ===
    pub tank_size: f32,
    /// Pixels per second
    pub tank_speed: f32,
    /// Radians per second for left/right intents
    pub tank_turn_speed: f32,
    pub tank_max_health: i32,
    pub player_fire_interval_ms: u64,

    // === Enemies ===
    pub enemy_size: f32,
    pub enemy_base_health: i32,
    pub enemy_health_per_level: i32,
    pub max_enemies: usize,
    /// Minimum spacing between enemies placed in the same level
    pub enemy_min_spacing: f32,
    pub enemy_spawn_distance: DistanceScale,

    // === Enemy AI ===
    pub ai_update_interval_ms: u64,
    pub wander_change_interval_ms: u64,
    /// Pixels per second at difficulty tier 0
    pub enemy_base_speed: f32,
    pub detection_radius: f32,
    pub shooting_radius: f32,
    pub enemy_shot_interval_ms: u64,
    pub enemy_standoff: DistanceScale,
    /// Distance from the bounds at which wandering enemies pick a new heading
    pub wander_edge_margin: f32,
    /// Force applied toward the arena center after a containment snap
    pub containment_nudge: f32,

    // === Projectiles ===
    pub projectile_speed: f32,
    pub projectile_size: f32,
    /// Gap between the shooter's hull and a freshly spawned projectile
    pub nozzle_gap: f32,
    pub player_shot_damage: i32,
    pub wall_shot_damage: i32,
    pub enemy_shot_damage: i32,
    /// Sphere-tracing budget for the swept probe
    pub probe_max_steps: usize,

    // === Walls ===
    pub obstacle_count: usize,
    pub obstacle_length: f32,
    pub obstacle_health: i32,
    pub boundary_wall_health: i32,
    pub obstacle_tank_clearance: f32,
    pub obstacle_spacing: f32,
    pub obstacle_boost_clearance: f32,

    // === Boost ===
    pub boost_size: f32,
    pub boost_wall_clearance: f32,
    pub boost_lifetime_ms: u64,

    /// Rejection-sampling budget per placed entity
    pub placement_attempts: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bounds_margin: 20.0,
            wall_thickness: 20.0,

            tank_size: 40.0,
            tank_speed: 150.0,
            tank_turn_speed: 3.0,
            tank_max_health: 100,
            player_fire_interval_ms: 300,

            enemy_size: 40.0,
            enemy_base_health: 100,
            enemy_health_per_level: 2,
            max_enemies: 3,
            enemy_min_spacing: 150.0,
            enemy_spawn_distance: DistanceScale {
                start: 0.85,
                step: 0.02,
                levels_per_step: 3,
                floor: 0.45,
            },

            ai_update_interval_ms: 150,
            wander_change_interval_ms: 5_000,
            enemy_base_speed: 60.0,
            detection_radius: 200.0,
            shooting_radius: 180.0,
            enemy_shot_interval_ms: 1_500,
            enemy_standoff: DistanceScale {
                start: 0.95,
                step: 0.02,
                levels_per_step: 3,
                floor: 0.55,
            },
            wander_edge_margin: 40.0,
            containment_nudge: 400.0,

            projectile_speed: 420.0,
            projectile_size: 6.0,
            nozzle_gap: 4.0,
            player_shot_damage: 50,
            wall_shot_damage: 50,
            enemy_shot_damage: 25,
            probe_max_steps: 32,

            obstacle_count: 5,
            obstacle_length: 90.0,
            obstacle_health: 100,
            boundary_wall_health: 1_000,
            obstacle_tank_clearance: 160.0,
            obstacle_spacing: 70.0,
            obstacle_boost_clearance: 150.0,

            boost_size: 30.0,
            boost_wall_clearance: 40.0,
            boost_lifetime_ms: 20_000,

            placement_attempts: 10,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tank_size", self.tank_size),
            ("enemy_size", self.enemy_size),
            ("projectile_size", self.projectile_size),
            ("projectile_speed", self.projectile_speed),
            ("boost_size", self.boost_size),
            ("wall_thickness", self.wall_thickness),
            ("obstacle_length", self.obstacle_length),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if self.bounds_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "bounds_margin",
                reason: "must not be negative".to_string(),
            });
        }
        if self.probe_max_steps == 0 {
            return Err(ConfigError::Invalid {
                field: "probe_max_steps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
