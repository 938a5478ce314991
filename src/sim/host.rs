//! Host collaborator
//!
//! Everything the core needs from the surrounding app: screen size, player
//! intents, level flags, health/score bookkeeping and sound playback. The
//! core calls these synchronously and never waits on their side effects.

use serde::{Deserialize, Serialize};

use super::geometry::ArenaSize;
use super::state::{LevelState, Tank};
use crate::audio::SoundEffect;
use crate::consts::SCORE_PER_KILL;

/// Joystick intent, already normalized by the gesture layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlIntent {
    /// Face `angle` (radians) and drive forward
    Move { angle: f32 },
    MoveForward,
    MoveBackward,
    /// Rotate counter-clockwise
    MoveLeft,
    /// Rotate clockwise
    MoveRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShootIntent {
    CreateBullet,
}

pub trait Host {
    fn screen_dimension(&self) -> ArenaSize;

    fn orientation_changed(&self) -> bool;

    fn set_orientation_changed(&mut self, changed: bool);

    fn control_intent(&self) -> Option<ControlIntent>;

    fn shoot_intent(&self) -> Option<ShootIntent>;

    fn current_level(&self) -> LevelState;

    fn set_current_level(&mut self, level: LevelState);

    fn user_health(&self) -> i32;

    fn set_user_health(&mut self, health: i32);

    /// Award the fixed per-kill score
    fn update_score(&mut self);

    /// The current level has no enemies left
    fn on_win(&mut self);

    /// Apply the host-defined boost reward
    fn on_boost_collected(&mut self, tank: &Tank);

    /// Best-effort; the core ignores the outcome
    fn play_sound(&mut self, sound: SoundEffect);

    /// Start a new run identity after the player tank is destroyed
    fn reset_player_identity(&mut self);
}

/// In-memory host used by the native binary and tests
#[derive(Debug, Clone)]
pub struct LocalHost {
    pub screen: ArenaSize,
    pub orientation_changed: bool,
    pub control: Option<ControlIntent>,
    pub shoot: Option<ShootIntent>,
    pub level: LevelState,
    pub health: i32,
    pub max_health: i32,
    pub score: u64,
    pub wins: u32,
    pub boosts_collected: u32,
    pub user_id: String,
    pub sounds: Vec<SoundEffect>,
    runs: u32,
}

impl LocalHost {
    /// Health restored by a boost
    pub const BOOST_HEALTH: i32 = 20;
    /// Score granted by a boost
    pub const BOOST_SCORE: u64 = 50;

    pub fn new(screen: ArenaSize, max_health: i32) -> Self {
        Self {
            screen,
            orientation_changed: false,
            control: None,
            shoot: None,
            level: LevelState::default(),
            health: max_health,
            max_health,
            score: 0,
            wins: 0,
            boosts_collected: 0,
            user_id: "run-1".to_string(),
            sounds: Vec::new(),
            runs: 1,
        }
    }

    /// Move to the next level after a win
    pub fn advance_level(&mut self) {
        self.level = LevelState::new(self.level.level + 1);
    }
}

impl Host for LocalHost {
    fn screen_dimension(&self) -> ArenaSize {
        self.screen
    }

    fn orientation_changed(&self) -> bool {
        self.orientation_changed
    }

    fn set_orientation_changed(&mut self, changed: bool) {
        self.orientation_changed = changed;
    }

    fn control_intent(&self) -> Option<ControlIntent> {
        self.control
    }

    fn shoot_intent(&self) -> Option<ShootIntent> {
        self.shoot
    }

    fn current_level(&self) -> LevelState {
        self.level
    }

    fn set_current_level(&mut self, level: LevelState) {
        self.level = level;
    }

    fn user_health(&self) -> i32 {
        self.health
    }

    fn set_user_health(&mut self, health: i32) {
        self.health = health;
    }

    fn update_score(&mut self) {
        self.score += SCORE_PER_KILL;
    }

    fn on_win(&mut self) {
        self.wins += 1;
        log::info!("Level {} cleared (score {})", self.level.level, self.score);
    }

    fn on_boost_collected(&mut self, _tank: &Tank) {
        self.boosts_collected += 1;
        self.health = (self.health + Self::BOOST_HEALTH).min(self.max_health);
        self.score += Self::BOOST_SCORE;
    }

    fn play_sound(&mut self, sound: SoundEffect) {
        self.sounds.push(sound);
    }

    fn reset_player_identity(&mut self) {
        self.runs += 1;
        self.user_id = format!("run-{}", self.runs);
        log::info!("New run identity {}", self.user_id);
    }
}
