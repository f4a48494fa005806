//! Schedule assignment model.
//!
//! An assignment binds a scene to a calendar date and a time-of-day slot.
//! Each scene owns at most one active assignment. Re-scheduling recreates
//! the assignment rather than mutating it in place; regressing a scene to
//! `Unplanned` removes it.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::SceneStatus;

/// Status of an assignment. Mirrors the owning scene's status and is only
/// ever updated in lock-step with it by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    /// Scheduled, not yet started.
    Planned,
    /// Shoot underway.
    #[serde(alias = "shooting")]
    InProgress,
    /// Shot and wrapped.
    Completed,
    /// Slot released; kept for possible re-activation.
    Cancelled,
}

impl AssignmentStatus {
    /// The assignment status mirroring a scene status, or `None` for
    /// `Unplanned` (which carries no assignment).
    pub fn mirroring(status: SceneStatus) -> Option<Self> {
        match status {
            SceneStatus::Unplanned => None,
            SceneStatus::Planned => Some(AssignmentStatus::Planned),
            SceneStatus::InProgress => Some(AssignmentStatus::InProgress),
            SceneStatus::Completed => Some(AssignmentStatus::Completed),
            SceneStatus::Cancelled => Some(AssignmentStatus::Cancelled),
        }
    }
}

/// A scene's binding to a shoot date and time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    /// Owning scene.
    pub scene_id: String,
    /// Calendar date of the shoot.
    pub date: NaiveDate,
    /// Slot start, time of day. Invariant: `start_time < end_time`.
    pub start_time: NaiveTime,
    /// Slot end, time of day (exclusive).
    pub end_time: NaiveTime,
    /// Mirrors the owning scene's status.
    pub status: AssignmentStatus,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

impl ScheduleAssignment {
    /// Creates a planned assignment for the given scene and slot.
    pub fn new(
        scene_id: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            scene_id: scene_id.into(),
            date,
            start_time,
            end_time,
            status: AssignmentStatus::Planned,
            notes: String::new(),
        }
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Whether the slot's time range is well-formed (`start < end`).
    #[inline]
    pub fn has_valid_range(&self) -> bool {
        self.start_time < self.end_time
    }

    /// Checks the time-range invariant, rejecting malformed input.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.has_valid_range() {
            Ok(())
        } else {
            Err(EngineError::Validation(format!(
                "assignment for scene '{}' has start {} not before end {}",
                self.scene_id, self.start_time, self.end_time
            )))
        }
    }

    /// Slot duration in whole minutes. Zero for malformed ranges.
    pub fn duration_minutes(&self) -> u32 {
        (self.end_time - self.start_time).num_minutes().max(0) as u32
    }

    /// Whether two same-day slots overlap. Half-open test: touching slots
    /// (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}
