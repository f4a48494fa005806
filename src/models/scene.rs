//! Scene model.
//!
//! A scene is one discrete shoot unit, created by script ingestion or manual
//! entry and tracked through the status workflow until completion.
//!
//! # Status Vocabulary
//! Some upstream data sources label the in-progress state `"shooting"`. That
//! alias is collapsed to [`SceneStatus::InProgress`] during deserialization
//! and never appears inside the engine; serialization always emits the
//! canonical kebab-case form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Workflow status of a scene. Closed set; see [`crate::workflow`] for the
/// allowed transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneStatus {
    /// Not yet placed on the calendar.
    Unplanned,
    /// Scheduled with a date and time slot.
    Planned,
    /// Currently being shot. Legacy sources call this `"shooting"`.
    #[serde(alias = "shooting")]
    InProgress,
    /// Shot and wrapped. Terminal.
    Completed,
    /// Dropped from the schedule. Re-activation to `Planned` is allowed.
    Cancelled,
}

impl SceneStatus {
    /// All five statuses, in workflow order.
    pub const ALL: [SceneStatus; 5] = [
        SceneStatus::Unplanned,
        SceneStatus::Planned,
        SceneStatus::InProgress,
        SceneStatus::Completed,
        SceneStatus::Cancelled,
    ];

    /// Canonical wire name (kebab-case, matches the serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Unplanned => "unplanned",
            SceneStatus::Planned => "planned",
            SceneStatus::InProgress => "in-progress",
            SceneStatus::Completed => "completed",
            SceneStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the status admits no further forward transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Cancelled)
    }

    /// Whether the scene occupies a calendar slot in this status.
    pub fn is_scheduled(&self) -> bool {
        matches!(
            self,
            SceneStatus::Planned | SceneStatus::InProgress | SceneStatus::Completed
        )
    }
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location classification. Drives the weather-risk conflict rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationKind {
    /// Enclosed set or studio; weather independent.
    Indoor,
    /// Exposed location; weather dependent.
    Outdoor,
    /// Not yet classified by the catalog.
    #[default]
    Unknown,
}

/// A scene to be scheduled and shot.
///
/// Actor and resource references are kept as sorted sets so that conflict
/// messages and scheduler ordering are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Opaque unique identifier.
    pub id: String,
    /// Ordinal/display label (e.g. "12A"). Not unique across re-ordering.
    #[serde(default)]
    pub sequence_number: String,
    /// Workflow status.
    #[serde(default = "default_status")]
    pub status: SceneStatus,
    /// Free-text location name.
    #[serde(default)]
    pub location: String,
    /// Indoor/outdoor classification.
    #[serde(default)]
    pub location_kind: LocationKind,
    /// Actor identifiers required on set. May be empty pending catalog linkage.
    #[serde(default)]
    pub required_actors: BTreeSet<String>,
    /// Equipment/prop identifiers required on set.
    #[serde(default)]
    pub required_resources: BTreeSet<String>,
    /// Estimated shoot duration in minutes. `None` = unknown.
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    /// Estimated cost, currency-agnostic.
    #[serde(default)]
    pub estimated_cost: f64,
}

fn default_status() -> SceneStatus {
    SceneStatus::Unplanned
}

impl Scene {
    /// Creates an unplanned scene with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence_number: String::new(),
            status: SceneStatus::Unplanned,
            location: String::new(),
            location_kind: LocationKind::Unknown,
            required_actors: BTreeSet::new(),
            required_resources: BTreeSet::new(),
            estimated_duration_minutes: None,
            estimated_cost: 0.0,
        }
    }

    /// Sets the display sequence number.
    pub fn with_sequence_number(mut self, number: impl Into<String>) -> Self {
        self.sequence_number = number.into();
        self
    }

    /// Sets the location name.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the location kind.
    pub fn with_location_kind(mut self, kind: LocationKind) -> Self {
        self.location_kind = kind;
        self
    }

    /// Adds a required actor.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.required_actors.insert(actor_id.into());
        self
    }

    /// Adds a required equipment/prop resource.
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.required_resources.insert(resource_id.into());
        self
    }

    /// Sets the estimated duration in minutes.
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = Some(minutes);
        self
    }

    /// Sets the estimated cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }
}
