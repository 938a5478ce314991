//! Error types shared by the simulation core and its host-side helpers

use thiserror::Error;

use crate::sim::EntityId;

/// Failures inside a simulation step. None of these are fatal to the run:
/// the orchestrator logs them and carries on with the next step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("entity {0} has no body in the physics world")]
    MissingBody(EntityId),
    #[error("no player tank is registered")]
    MissingTank,
    #[error("invalid arena dimensions {width}x{height}")]
    InvalidArena { width: f32, height: f32 },
}

/// Failures loading tuning or settings documents
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures talking to the key/value persistence collaborator
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("could not encode or decode record `{key}`: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage backend rejected `{key}`: {reason}")]
    Backend { key: String, reason: String },
}
