//! Scheduling conflict model.
//!
//! Conflicts are derived warnings, recomputed on demand from the current
//! schedule snapshot — never persisted as a source of truth. Each conflict
//! carries a deterministic, templated message: re-running detection over
//! unchanged inputs reproduces the exact same text.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// Conflict severity. Ordered so that `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Cost or convenience concern; schedule remains workable.
    Low,
    /// Risk worth reviewing before the shoot day.
    Medium,
    /// Placement is not workable as-is.
    High,
}

/// Classification of scheduling conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Overlapping same-day slots sharing an actor or resource.
    ResourceDoubleBooking,
    /// Outdoor shoot exposed to weather.
    WeatherRisk,
    /// Weekend shoot day incurring premium crew rates.
    WeekendCost,
    /// Slot start is not before its end.
    InvalidTimeRange,
    /// Catalog marks a required actor unavailable on the shoot date.
    ActorUnavailable,
}

impl ConflictKind {
    /// Stable name used for tie-break ordering and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::ResourceDoubleBooking => "resource-double-booking",
            ConflictKind::WeatherRisk => "weather-risk",
            ConflictKind::WeekendCost => "weekend-cost",
            ConflictKind::InvalidTimeRange => "invalid-time-range",
            ConflictKind::ActorUnavailable => "actor-unavailable",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// What rule fired.
    pub kind: ConflictKind,
    /// How serious it is.
    pub severity: Severity,
    /// Affected scenes, candidate first. At least one entry; at least two
    /// for double-booking.
    pub affected_scene_ids: Vec<String>,
    /// Templated human-readable explanation.
    pub message: String,
}

impl Conflict {
    /// Slot start not before end. High severity.
    pub fn invalid_time_range(scene_id: &str, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            kind: ConflictKind::InvalidTimeRange,
            severity: Severity::High,
            affected_scene_ids: vec![scene_id.to_string()],
            message: format!(
                "Scene {scene_id} has an invalid time range: start {start} is not before end {end}"
            ),
        }
    }

    /// Weekend shoot day. Low severity.
    pub fn weekend_cost(scene_id: &str, date: NaiveDate, weekday: Weekday) -> Self {
        Self {
            kind: ConflictKind::WeekendCost,
            severity: Severity::Low,
            affected_scene_ids: vec![scene_id.to_string()],
            message: format!(
                "Scene {scene_id} is scheduled on {date} ({weekday}), incurring weekend rates"
            ),
        }
    }

    /// Outdoor shoot exposed to weather. Medium severity.
    pub fn weather_risk(scene_id: &str, date: NaiveDate) -> Self {
        Self {
            kind: ConflictKind::WeatherRisk,
            severity: Severity::Medium,
            affected_scene_ids: vec![scene_id.to_string()],
            message: format!("Scene {scene_id} shoots outdoors on {date} and is exposed to weather"),
        }
    }

    /// Overlapping slots sharing personnel or equipment. High severity.
    ///
    /// `shared` must already be sorted for deterministic message text.
    pub fn resource_double_booking(
        scene_id: &str,
        other_scene_id: &str,
        date: NaiveDate,
        shared: &[String],
    ) -> Self {
        Self {
            kind: ConflictKind::ResourceDoubleBooking,
            severity: Severity::High,
            affected_scene_ids: vec![scene_id.to_string(), other_scene_id.to_string()],
            message: format!(
                "Scenes {scene_id} and {other_scene_id} overlap on {date} and both need {}",
                shared.join(", ")
            ),
        }
    }

    /// Required actor unavailable on the shoot date. Medium severity.
    pub fn actor_unavailable(scene_id: &str, actor_id: &str, date: NaiveDate) -> Self {
        Self {
            kind: ConflictKind::ActorUnavailable,
            severity: Severity::Medium,
            affected_scene_ids: vec![scene_id.to_string()],
            message: format!("Actor {actor_id} is unavailable on {date} for scene {scene_id}"),
        }
    }

    /// Whether the conflict blocks placement (High severity).
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Sorts conflicts into the canonical report order: severity descending,
/// then kind name ascending. Stable for ties, so insertion order decides
/// among equal entries.
pub fn sort_canonical(conflicts: &mut [Conflict]) {
    conflicts.sort_by_key(|c| (Reverse(c.severity), c.kind.as_str()));
}
