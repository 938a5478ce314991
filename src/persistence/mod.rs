//! Key/value persistence collaborator
//!
//! The host owns the real storage (device preferences, local storage, ...).
//! The crate only needs string values under string keys, with JSON records
//! for the few shapes it reads and writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::PersistenceError;
use crate::sim::LevelState;

/// Storage keys
pub const CURRENT_LEVEL_KEY: &str = "currentLevel";
pub const LATEST_SCORE_KEY: &str = "latestScore";
pub const HIGH_SCORES_KEY: &str = "highScores";

/// String key/value storage provided by the host
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Read and decode a JSON record. `Ok(None)` when the key is absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistenceError::Serde {
            key: key.to_string(),
            source,
        })
}

pub fn store_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(value).map_err(|source| PersistenceError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &json)
}

/// Level flags plus the score reached so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(flatten)]
    pub level: LevelState,
    pub score: u64,
}

pub fn save_progress(
    store: &mut dyn KeyValueStore,
    progress: &ProgressRecord,
) -> Result<(), PersistenceError> {
    store_json(store, CURRENT_LEVEL_KEY, progress)?;
    store_json(store, LATEST_SCORE_KEY, &progress.score)
}

pub fn load_progress(store: &dyn KeyValueStore) -> Result<Option<ProgressRecord>, PersistenceError> {
    load_json(store, CURRENT_LEVEL_KEY)
}

pub fn latest_score(store: &dyn KeyValueStore) -> Result<Option<u64>, PersistenceError> {
    load_json(store, LATEST_SCORE_KEY)
}

/// Forget saved progress (explicit user action; errors go back to the UI)
pub fn clear_progress(store: &mut dyn KeyValueStore) -> Result<(), PersistenceError> {
    store.remove(CURRENT_LEVEL_KEY)?;
    store.remove(LATEST_SCORE_KEY)?;
    log::info!("Saved progress cleared");
    Ok(())
}
