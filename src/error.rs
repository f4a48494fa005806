//! Engine error taxonomy.
//!
//! Every fallible operation in the engine returns [`EngineError`]. Two kinds
//! are transient and worth retrying (`StoreUnavailable`, `VersionConflict`);
//! the rest indicate a rejected or malformed request and retrying without
//! changing the input will fail again. Batch operations catch transient
//! per-scene failures and report them in their result instead of aborting
//! the whole batch.

use crate::models::SceneStatus;

/// Errors raised by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The requested status transition is not in the allowed-edges table.
    #[error("invalid transition: {from} -> {to} is not allowed")]
    InvalidTransition {
        /// Status the scene is currently in.
        from: SceneStatus,
        /// Status that was requested.
        to: SceneStatus,
    },

    /// A scheduled target status requires a valid assignment, but the scene
    /// has none or its time range is invalid.
    #[error("scene '{scene_id}' has no valid schedule assignment for this transition")]
    MissingOrInvalidAssignment {
        /// Scene whose assignment is missing or invalid.
        scene_id: String,
    },

    /// No scene with the given id exists in the store.
    #[error("scene '{scene_id}' not found")]
    SceneNotFound {
        /// The unknown scene id.
        scene_id: String,
    },

    /// The scene store could not be reached. Transient; retry is reasonable.
    #[error("scene store unavailable: {0}")]
    StoreUnavailable(String),

    /// A concurrent write changed the scene since it was read. Transient;
    /// the caller should re-fetch and retry once.
    #[error("version conflict on scene '{scene_id}': concurrent modification")]
    VersionConflict {
        /// Scene whose version check failed.
        scene_id: String,
    },

    /// Malformed input, e.g. an assignment whose start is not before its end.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl EngineError {
    /// Whether the error is transient and the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::StoreUnavailable(_) | EngineError::VersionConflict { .. }
        )
    }
}
