//! High score leaderboard
//!
//! Persisted through the host's key/value store, tracks the top 10 runs.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, HIGH_SCORES_KEY, KeyValueStore};

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Run identity (changes every time the player tank is destroyed)
    pub user_id: String,
    pub score: u64,
}

/// Best runs, highest score first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `score` would make it onto a full or partial board
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0
            && (self.entries.len() < MAX_HIGH_SCORES
                || self.entries.last().is_none_or(|lowest| score > lowest.score))
    }

    /// Record `score` for `user_id`, keeping only that run's best.
    /// Returns the 1-based rank, or None when nothing changed.
    pub fn add_score(&mut self, user_id: &str, score: u64) -> Option<usize> {
        let previous = self.entries.iter().position(|e| e.user_id == user_id);
        if previous.is_some_and(|i| self.entries[i].score >= score) {
            return None;
        }
        if let Some(i) = previous {
            self.entries.remove(i);
        }
        if !self.qualifies(score) {
            return None;
        }

        // Ties keep the earlier run ahead
        let index = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(
            index,
            HighScoreEntry {
                user_id: user_id.to_string(),
                score,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<HighScores>(store, HIGH_SCORES_KEY) {
            Ok(Some(scores)) => {
                log::info!("Leaderboard restored ({} runs)", scores.entries.len());
                scores
            }
            Ok(None) => Self::new(),
            Err(err) => {
                log::warn!("Discarding unreadable high scores: {}", err);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match persistence::store_json(store, HIGH_SCORES_KEY, self) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(err) => log::warn!("High scores not saved: {}", err),
        }
    }
}
