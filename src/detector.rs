//! Conflict detection.
//!
//! Evaluates a fixed rule set against a candidate placement and a snapshot
//! of the existing schedule. Detection is a pure function of its inputs:
//! no hidden state, all applicable rules reported (never short-circuited),
//! and deterministic output ordering (severity descending, then kind name).
//!
//! # Rules
//!
//! | Rule | Severity | Trigger |
//! |------|----------|---------|
//! | InvalidTimeRange | High | `start >= end` |
//! | ResourceDoubleBooking | High | overlapping same-day slot sharing an actor/resource |
//! | WeatherRisk | Medium | outdoor location |
//! | ActorUnavailable | Medium | catalog marks a required actor unavailable |
//! | WeekendCost | Low | date falls on a configured weekend day |

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::collections::{BTreeSet, HashSet};

use crate::models::{
    sort_canonical, AssignmentStatus, Conflict, LocationKind, Scene, ScheduleAssignment,
};
use crate::store::{Availability, ResourceDirectory, SceneRecord};

/// Detector configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Days of the week billed at weekend rates.
    pub weekend_days: HashSet<Weekday>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            weekend_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

/// A proposed placement of one scene on the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementCandidate {
    /// Scene being placed.
    pub scene_id: String,
    /// Proposed shoot date.
    pub date: NaiveDate,
    /// Proposed slot start.
    pub start_time: NaiveTime,
    /// Proposed slot end.
    pub end_time: NaiveTime,
    /// The scene's location classification.
    pub location_kind: LocationKind,
    /// Actors the scene requires.
    pub actors: BTreeSet<String>,
    /// Equipment/props the scene requires.
    pub resources: BTreeSet<String>,
}

impl PlacementCandidate {
    /// Builds a candidate from a scene and a proposed slot.
    pub fn for_scene(scene: &Scene, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            scene_id: scene.id.clone(),
            date,
            start_time: start,
            end_time: end,
            location_kind: scene.location_kind,
            actors: scene.required_actors.clone(),
            resources: scene.required_resources.clone(),
        }
    }
}

/// One existing assignment as seen by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// Owning scene.
    pub scene_id: String,
    /// Assigned date.
    pub date: NaiveDate,
    /// Slot start.
    pub start_time: NaiveTime,
    /// Slot end.
    pub end_time: NaiveTime,
    /// Assignment status. Cancelled entries never conflict.
    pub status: AssignmentStatus,
    /// The scene's location classification.
    pub location_kind: LocationKind,
    /// Actors the scene requires.
    pub actors: BTreeSet<String>,
    /// Equipment/props the scene requires.
    pub resources: BTreeSet<String>,
}

impl SnapshotEntry {
    fn from_record(scene: &Scene, assignment: &ScheduleAssignment) -> Self {
        Self {
            scene_id: scene.id.clone(),
            date: assignment.date,
            start_time: assignment.start_time,
            end_time: assignment.end_time,
            status: assignment.status,
            location_kind: scene.location_kind,
            actors: scene.required_actors.clone(),
            resources: scene.required_resources.clone(),
        }
    }

    fn overlaps_candidate(&self, candidate: &PlacementCandidate) -> bool {
        self.date == candidate.date
            && self.start_time < candidate.end_time
            && candidate.start_time < self.end_time
    }
}

/// Immutable read snapshot of the current schedule.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl ScheduleSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from store records, keeping only scenes that have
    /// an assignment. Record order is preserved, so snapshots built from a
    /// stable-ordered store are themselves stable.
    pub fn from_records(records: &[SceneRecord]) -> Self {
        let entries = records
            .iter()
            .filter_map(|r| {
                r.assignment
                    .as_ref()
                    .map(|a| SnapshotEntry::from_record(&r.scene, a))
            })
            .collect();
        Self { entries }
    }

    /// Adds one entry.
    pub fn push(&mut self, entry: SnapshotEntry) {
        self.entries.push(entry);
    }

    /// Adds one entry, builder style.
    pub fn with_entry(mut self, entry: SnapshotEntry) -> Self {
        self.push(entry);
        self
    }

    /// All entries.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Entries on a given date whose assignment is not cancelled.
    pub fn active_on(&self, date: NaiveDate) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries
            .iter()
            .filter(move |e| e.date == date && e.status != AssignmentStatus::Cancelled)
    }
}

/// Rule-based conflict detector.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    config: DetectorConfig,
}

impl ConflictDetector {
    /// Creates a detector with the default weekend set (Sat/Sun).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector with a custom configuration.
    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluates every rule against the candidate and returns all conflicts,
    /// sorted by severity descending then kind name.
    pub fn detect(
        &self,
        candidate: &PlacementCandidate,
        snapshot: &ScheduleSnapshot,
        directory: &dyn ResourceDirectory,
    ) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        // Rule 1: time range validity
        if candidate.start_time >= candidate.end_time {
            conflicts.push(Conflict::invalid_time_range(
                &candidate.scene_id,
                candidate.start_time,
                candidate.end_time,
            ));
        }

        // Rule 2: weekend cost
        let weekday = candidate.date.weekday();
        if self.config.weekend_days.contains(&weekday) {
            conflicts.push(Conflict::weekend_cost(
                &candidate.scene_id,
                candidate.date,
                weekday,
            ));
        }

        // Rule 3: weather risk
        if candidate.location_kind == LocationKind::Outdoor {
            conflicts.push(Conflict::weather_risk(&candidate.scene_id, candidate.date));
        }

        // Rule 4: resource double-booking
        for entry in snapshot.active_on(candidate.date) {
            if entry.scene_id == candidate.scene_id || !entry.overlaps_candidate(candidate) {
                continue;
            }
            let shared: Vec<String> = candidate
                .actors
                .intersection(&entry.actors)
                .chain(candidate.resources.intersection(&entry.resources))
                .cloned()
                .collect();
            if !shared.is_empty() {
                conflicts.push(Conflict::resource_double_booking(
                    &candidate.scene_id,
                    &entry.scene_id,
                    candidate.date,
                    &shared,
                ));
            }
        }

        // Rule 5: actor availability (only when the catalog has data)
        for actor in &candidate.actors {
            if directory.is_actor_available(actor, candidate.date) == Availability::Unavailable {
                conflicts.push(Conflict::actor_unavailable(
                    &candidate.scene_id,
                    actor,
                    candidate.date,
                ));
            }
        }

        sort_canonical(&mut conflicts);
        conflicts
    }

    /// Evaluates every scheduled scene in the snapshot against the rest.
    ///
    /// Symmetric double-booking pairs are reported once, from the side that
    /// appears first in the snapshot.
    pub fn scan(
        &self,
        snapshot: &ScheduleSnapshot,
        directory: &dyn ResourceDirectory,
    ) -> Vec<Conflict> {
        let mut seen: BTreeSet<(&'static str, Vec<String>)> = BTreeSet::new();
        let mut conflicts = Vec::new();

        for entry in snapshot.entries() {
            if entry.status == AssignmentStatus::Cancelled {
                continue;
            }
            let candidate = PlacementCandidate {
                scene_id: entry.scene_id.clone(),
                date: entry.date,
                start_time: entry.start_time,
                end_time: entry.end_time,
                location_kind: entry.location_kind,
                actors: entry.actors.clone(),
                resources: entry.resources.clone(),
            };
            for conflict in self.detect(&candidate, snapshot, directory) {
                let mut key_ids = conflict.affected_scene_ids.clone();
                key_ids.sort();
                if seen.insert((conflict.kind.as_str(), key_ids)) {
                    conflicts.push(conflict);
                }
            }
        }

        sort_canonical(&mut conflicts);
        conflicts
    }
}
