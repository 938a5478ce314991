//! Game settings and preferences
//!
//! Persisted separately from progress through the host's key/value store.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master switch passed to every simulation tick
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when the app is backgrounded
    pub mute_on_blur: bool,

    // === Controls ===
    /// Haptic pulse on hits
    pub vibration: bool,
    /// Joystick dead zone (0.0 - 1.0)
    pub joystick_dead_zone: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,

            vibration: true,
            joystick_dead_zone: 0.15,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "tank_arena_settings";

    /// Whether sounds should play while the app is in the given focus state
    pub fn effective_sound(&self, focused: bool) -> bool {
        self.sound_enabled && (focused || !self.mute_on_blur)
    }

    /// Load settings, falling back to defaults on a missing or bad record
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Ignoring unreadable settings: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match persistence::store_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("Settings not saved: {}", err),
        }
    }
}
