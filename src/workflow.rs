//! Status state machine.
//!
//! Pure transition rules for the scene workflow. The stateful application
//! (store write plus event emission) lives in [`crate::engine`]; this module
//! only answers "is this edge allowed, and are its preconditions met".
//!
//! # Allowed edges
//!
//! ```text
//! Unplanned -> Planned -> InProgress -> Completed
//!     ^           |
//!     +-----------+          (regression: assignment is removed)
//! Unplanned | Planned | InProgress -> Cancelled
//! Cancelled -> Planned       (re-activation)
//! ```
//!
//! `Completed` is terminal. Self-transitions are rejected, which makes
//! applying the same transition twice fail cleanly on the second attempt.

use crate::error::EngineError;
use crate::models::{SceneStatus, ScheduleAssignment};

/// Whether the edge `from -> to` is in the allowed-transitions table.
pub fn allowed(from: SceneStatus, to: SceneStatus) -> bool {
    use SceneStatus::*;
    matches!(
        (from, to),
        (Unplanned, Planned)
            | (Planned, InProgress)
            | (InProgress, Completed)
            | (Planned, Unplanned)
            | (Unplanned, Cancelled)
            | (Planned, Cancelled)
            | (InProgress, Cancelled)
            | (Cancelled, Planned)
    )
}

/// All statuses reachable from `from` in one transition.
pub fn targets(from: SceneStatus) -> Vec<SceneStatus> {
    SceneStatus::ALL
        .into_iter()
        .filter(|&to| allowed(from, to))
        .collect()
}

/// Validates a transition against the edge table and its preconditions.
///
/// Targets that place the scene on the calendar (`Planned`, `InProgress`)
/// require an existing assignment with a well-formed time range.
pub fn validate(
    scene_id: &str,
    from: SceneStatus,
    to: SceneStatus,
    assignment: Option<&ScheduleAssignment>,
) -> Result<(), EngineError> {
    if !allowed(from, to) {
        return Err(EngineError::InvalidTransition { from, to });
    }

    if matches!(to, SceneStatus::Planned | SceneStatus::InProgress) {
        match assignment {
            Some(a) if a.has_valid_range() => {}
            _ => {
                return Err(EngineError::MissingOrInvalidAssignment {
                    scene_id: scene_id.to_string(),
                })
            }
        }
    }

    Ok(())
}
