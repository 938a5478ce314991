//! Sound effect vocabulary
//!
//! The simulation only names sounds; playing them is the host's business and
//! is strictly fire-and-forget. `AudioManager` is the volume/mute bookkeeping a
//! native host uses before handing a cue to its mixer.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEffect {
    /// Any tank fires
    Shot,
    /// Enemy or player tank destroyed
    Explosion,
    /// Non-lethal hit
    Collision,
    /// Boost collected
    Bonus,
    /// Level cleared
    Win,
    /// Player tank destroyed
    Lose,
}

impl SoundEffect {
    /// Asset name the host keys its sound bank by
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Shot => "shot",
            SoundEffect::Explosion => "explosion",
            SoundEffect::Collision => "collision",
            SoundEffect::Bonus => "bonus",
            SoundEffect::Win => "win",
            SoundEffect::Lose => "lose",
        }
    }

    /// Base gain before master/sfx volume
    fn base_gain(&self) -> f32 {
        match self {
            SoundEffect::Shot => 0.5,
            SoundEffect::Collision => 0.6,
            SoundEffect::Explosion | SoundEffect::Lose => 1.0,
            SoundEffect::Bonus | SoundEffect::Win => 0.8,
        }
    }
}

/// Audio manager for native hosts
#[derive(Debug, Clone)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: u64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: !settings.sound_enabled,
            played: 0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Final gain for an effect, 0 when muted
    pub fn gain_for(&self, effect: SoundEffect) -> f32 {
        if self.muted {
            return 0.0;
        }
        effect.base_gain() * self.master_volume * self.sfx_volume
    }

    /// Hand a cue to the mixer. Returns false when nothing was played.
    pub fn play(&mut self, effect: SoundEffect) -> bool {
        let gain = self.gain_for(effect);
        if gain <= 0.0 {
            return false;
        }
        self.played += 1;
        log::debug!("play {} at gain {:.2}", effect.name(), gain);
        true
    }

    /// Number of cues actually played
    pub fn played(&self) -> u64 {
        self.played
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_sound_bank() {
        assert_eq!(SoundEffect::Shot.name(), "shot");
        assert_eq!(SoundEffect::Lose.name(), "lose");
        assert_eq!(serde_json::to_string(&SoundEffect::Bonus).unwrap(), r#""bonus""#);
    }

    #[test]
    fn test_muted_manager_plays_nothing() {
        let settings = Settings {
            sound_enabled: false,
            ..Settings::default()
        };
        let mut audio = AudioManager::from_settings(&settings);
        assert!(!audio.play(SoundEffect::Explosion));
        assert_eq!(audio.played(), 0);

        audio.set_muted(false);
        assert!(audio.play(SoundEffect::Explosion));
        assert_eq!(audio.played(), 1);
    }
}
