//! Scene store and collaborator contracts.
//!
//! The engine reads and writes scenes through [`SceneStore`], looks up actor
//! availability through [`ResourceDirectory`], and emits events through
//! [`NotificationSink`]. Production systems back these with a persistence
//! service and a message bus; [`InMemorySceneStore`] provides the reference
//! implementation with the same optimistic-concurrency semantics.
//!
//! # Concurrency
//!
//! Writes are compare-and-swap on a per-scene version counter. A write whose
//! expected version no longer matches fails with a retryable
//! [`EngineError::VersionConflict`] instead of silently overwriting. A scene
//! and its assignment always commit together under one version bump, which
//! is what makes the state machine's paired status update atomic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::EngineError;
use crate::models::{Scene, SceneStatus, ScheduleAssignment};

/// A scene with its assignment and optimistic-concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    /// The scene.
    pub scene: Scene,
    /// The scene's active assignment, if any.
    pub assignment: Option<ScheduleAssignment>,
    /// Version token; pass back as `expected_version` when saving.
    pub version: u64,
}

/// Persistence contract for scenes and their assignments.
pub trait SceneStore {
    /// Adds a new scene. Fails with `Validation` if the id already exists.
    fn insert(&self, scene: Scene) -> Result<u64, EngineError>;

    /// Fetches one scene record.
    fn get(&self, scene_id: &str) -> Result<SceneRecord, EngineError>;

    /// Lists all scene records in stable (id) order.
    fn list(&self) -> Result<Vec<SceneRecord>, EngineError>;

    /// Writes a scene and its assignment together, guarded by CAS on
    /// `expected_version`. Returns the new version.
    fn save(
        &self,
        scene: Scene,
        assignment: Option<ScheduleAssignment>,
        expected_version: u64,
    ) -> Result<u64, EngineError>;

    /// Replaces a scene's assignment without touching its status.
    fn save_assignment(&self, assignment: ScheduleAssignment) -> Result<(), EngineError>;

    /// Removes a scene's assignment without touching its status.
    fn delete_assignment(&self, scene_id: &str) -> Result<(), EngineError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    scene: Scene,
    assignment: Option<ScheduleAssignment>,
    version: u64,
}

/// In-memory [`SceneStore`] with CAS versioning.
///
/// A single mutex serializes writes; per-scene version counters reject stale
/// writers. Iteration order is stable (sorted by scene id).
#[derive(Debug, Default)]
pub struct InMemorySceneStore {
    entries: Mutex<BTreeMap<String, StoredEntry>>,
}

impl InMemorySceneStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredEntry>>, EngineError> {
        self.entries
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("scene store lock poisoned".into()))
    }
}

impl SceneStore for InMemorySceneStore {
    fn insert(&self, scene: Scene) -> Result<u64, EngineError> {
        let mut entries = self.lock()?;
        if entries.contains_key(&scene.id) {
            return Err(EngineError::Validation(format!(
                "scene '{}' already exists",
                scene.id
            )));
        }
        let id = scene.id.clone();
        entries.insert(
            id,
            StoredEntry {
                scene,
                assignment: None,
                version: 1,
            },
        );
        Ok(1)
    }

    fn get(&self, scene_id: &str) -> Result<SceneRecord, EngineError> {
        let entries = self.lock()?;
        let entry = entries
            .get(scene_id)
            .ok_or_else(|| EngineError::SceneNotFound {
                scene_id: scene_id.to_string(),
            })?;
        Ok(SceneRecord {
            scene: entry.scene.clone(),
            assignment: entry.assignment.clone(),
            version: entry.version,
        })
    }

    fn list(&self) -> Result<Vec<SceneRecord>, EngineError> {
        let entries = self.lock()?;
        Ok(entries
            .values()
            .map(|e| SceneRecord {
                scene: e.scene.clone(),
                assignment: e.assignment.clone(),
                version: e.version,
            })
            .collect())
    }

    fn save(
        &self,
        scene: Scene,
        assignment: Option<ScheduleAssignment>,
        expected_version: u64,
    ) -> Result<u64, EngineError> {
        if let Some(a) = &assignment {
            if a.scene_id != scene.id {
                return Err(EngineError::Validation(format!(
                    "assignment for scene '{}' saved against scene '{}'",
                    a.scene_id, scene.id
                )));
            }
        }

        let mut entries = self.lock()?;
        let entry = entries
            .get_mut(&scene.id)
            .ok_or_else(|| EngineError::SceneNotFound {
                scene_id: scene.id.clone(),
            })?;
        if entry.version != expected_version {
            return Err(EngineError::VersionConflict {
                scene_id: scene.id.clone(),
            });
        }

        entry.scene = scene;
        entry.assignment = assignment;
        entry.version += 1;
        Ok(entry.version)
    }

    fn save_assignment(&self, assignment: ScheduleAssignment) -> Result<(), EngineError> {
        assignment.validate()?;
        let mut entries = self.lock()?;
        let entry =
            entries
                .get_mut(&assignment.scene_id)
                .ok_or_else(|| EngineError::SceneNotFound {
                    scene_id: assignment.scene_id.clone(),
                })?;
        entry.assignment = Some(assignment);
        entry.version += 1;
        Ok(())
    }

    fn delete_assignment(&self, scene_id: &str) -> Result<(), EngineError> {
        let mut entries = self.lock()?;
        let entry = entries
            .get_mut(scene_id)
            .ok_or_else(|| EngineError::SceneNotFound {
                scene_id: scene_id.to_string(),
            })?;
        entry.assignment = None;
        entry.version += 1;
        Ok(())
    }
}

impl<T: SceneStore + ?Sized> SceneStore for std::sync::Arc<T> {
    fn insert(&self, scene: Scene) -> Result<u64, EngineError> {
        (**self).insert(scene)
    }
    fn get(&self, scene_id: &str) -> Result<SceneRecord, EngineError> {
        (**self).get(scene_id)
    }
    fn list(&self) -> Result<Vec<SceneRecord>, EngineError> {
        (**self).list()
    }
    fn save(
        &self,
        scene: Scene,
        assignment: Option<ScheduleAssignment>,
        expected_version: u64,
    ) -> Result<u64, EngineError> {
        (**self).save(scene, assignment, expected_version)
    }
    fn save_assignment(&self, assignment: ScheduleAssignment) -> Result<(), EngineError> {
        (**self).save_assignment(assignment)
    }
    fn delete_assignment(&self, scene_id: &str) -> Result<(), EngineError> {
        (**self).delete_assignment(scene_id)
    }
}

/// Catalog answer for an actor's availability on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    /// Catalog confirms the actor is free.
    Available,
    /// Catalog marks the actor as booked or off.
    Unavailable,
    /// No availability data. Not a conflict.
    Unknown,
}

/// Actor availability lookup, backed by the production catalog.
pub trait ResourceDirectory {
    /// Whether `actor_id` is available to shoot on `date`.
    fn is_actor_available(&self, actor_id: &str, date: NaiveDate) -> Availability;
}

/// Directory with no data: every lookup answers `Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAvailabilityData;

impl ResourceDirectory for NoAvailabilityData {
    fn is_actor_available(&self, _actor_id: &str, _date: NaiveDate) -> Availability {
        Availability::Unknown
    }
}

/// Fixed availability table. Entries not listed answer `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct StaticAvailability {
    available: BTreeSet<(String, NaiveDate)>,
    unavailable: BTreeSet<(String, NaiveDate)>,
}

impl StaticAvailability {
    /// Creates an empty table (all lookups `Unknown`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an actor available on a date.
    pub fn with_available(mut self, actor_id: impl Into<String>, date: NaiveDate) -> Self {
        self.available.insert((actor_id.into(), date));
        self
    }

    /// Marks an actor unavailable on a date.
    pub fn with_unavailable(mut self, actor_id: impl Into<String>, date: NaiveDate) -> Self {
        self.unavailable.insert((actor_id.into(), date));
        self
    }
}

impl ResourceDirectory for StaticAvailability {
    fn is_actor_available(&self, actor_id: &str, date: NaiveDate) -> Availability {
        let key = (actor_id.to_string(), date);
        if self.unavailable.contains(&key) {
            Availability::Unavailable
        } else if self.available.contains(&key) {
            Availability::Available
        } else {
            Availability::Unknown
        }
    }
}

impl<T: ResourceDirectory + ?Sized> ResourceDirectory for std::sync::Arc<T> {
    fn is_actor_available(&self, actor_id: &str, date: NaiveDate) -> Availability {
        (**self).is_actor_available(actor_id, date)
    }
}

/// Events published to the notification/UI layer after a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// A scene's status changed.
    StatusChanged {
        /// Scene that changed.
        scene_id: String,
        /// Status before the transition.
        from: SceneStatus,
        /// Status after the transition.
        to: SceneStatus,
    },
    /// A scene was (re-)placed on the calendar.
    SceneRescheduled {
        /// Scene that moved.
        scene_id: String,
        /// New shoot date.
        date: NaiveDate,
    },
}

/// Fire-and-forget event sink. Publishing must never block or affect the
/// outcome of the operation that emitted the event.
pub trait NotificationSink {
    /// Delivers one event. Failures are the sink's problem, not the caller's.
    fn publish(&self, event: EngineEvent);
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn publish(&self, event: EngineEvent) {
        (**self).publish(event)
    }
}

/// Sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: EngineEvent) {}
}

/// Sink that records events for inspection. Intended for tests and demos.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, event: EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();

        let record = store.get("S1").unwrap();
        assert_eq!(record.scene.id, "S1");
        assert_eq!(record.version, 1);
        assert!(record.assignment.is_none());

        assert_matches!(store.get("S9"), Err(EngineError::SceneNotFound { .. }));
        assert_matches!(
            store.insert(Scene::new("S1")),
            Err(EngineError::Validation(_))
        );
    }

    #[test]
    fn test_cas_rejects_stale_writer() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();
        let record = store.get("S1").unwrap();

        // First writer commits; version advances.
        let v2 = store
            .save(record.scene.clone(), None, record.version)
            .unwrap();
        assert_eq!(v2, 2);

        // Second writer still holds version 1 and must fail, not overwrite.
        let err = store
            .save(record.scene.clone(), None, record.version)
            .unwrap_err();
        assert_matches!(err, EngineError::VersionConflict { .. });
        assert!(err.is_retryable());
    }

    #[test]
    fn test_scene_and_assignment_commit_together() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();
        let record = store.get("S1").unwrap();

        let mut scene = record.scene.clone();
        scene.status = SceneStatus::Planned;
        let assignment =
            ScheduleAssignment::new("S1", date("2025-03-03"), time("09:00"), time("11:00"));
        store
            .save(scene, Some(assignment), record.version)
            .unwrap();

        let after = store.get("S1").unwrap();
        assert_eq!(after.scene.status, SceneStatus::Planned);
        assert!(after.assignment.is_some());
        assert_eq!(after.version, 2);
    }

    #[test]
    fn test_save_rejects_mismatched_assignment() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();
        let record = store.get("S1").unwrap();

        let foreign =
            ScheduleAssignment::new("S2", date("2025-03-03"), time("09:00"), time("11:00"));
        assert_matches!(
            store.save(record.scene, Some(foreign), record.version),
            Err(EngineError::Validation(_))
        );
    }

    #[test]
    fn test_save_assignment_validates_range() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();

        let inverted =
            ScheduleAssignment::new("S1", date("2025-03-03"), time("11:00"), time("09:00"));
        assert_matches!(
            store.save_assignment(inverted),
            Err(EngineError::Validation(_))
        );
    }

    #[test]
    fn test_delete_assignment() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S1")).unwrap();
        store
            .save_assignment(ScheduleAssignment::new(
                "S1",
                date("2025-03-03"),
                time("09:00"),
                time("11:00"),
            ))
            .unwrap();

        store.delete_assignment("S1").unwrap();
        assert!(store.get("S1").unwrap().assignment.is_none());
    }

    #[test]
    fn test_list_stable_order() {
        let store = InMemorySceneStore::new();
        store.insert(Scene::new("S3")).unwrap();
        store.insert(Scene::new("S1")).unwrap();
        store.insert(Scene::new("S2")).unwrap();

        let ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.scene.id)
            .collect();
        assert_eq!(ids, vec!["S1", "S2", "S3"]);
    }

    #[test]
    fn test_static_availability() {
        let dir = StaticAvailability::new()
            .with_unavailable("A1", date("2025-03-03"))
            .with_available("A2", date("2025-03-03"));

        assert_eq!(
            dir.is_actor_available("A1", date("2025-03-03")),
            Availability::Unavailable
        );
        assert_eq!(
            dir.is_actor_available("A2", date("2025-03-03")),
            Availability::Available
        );
        // No data for other dates or actors
        assert_eq!(
            dir.is_actor_available("A1", date("2025-03-04")),
            Availability::Unknown
        );
        assert_eq!(
            NoAvailabilityData.is_actor_available("A1", date("2025-03-03")),
            Availability::Unknown
        );
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.publish(EngineEvent::StatusChanged {
            scene_id: "S1".into(),
            from: SceneStatus::Unplanned,
            to: SceneStatus::Planned,
        });
        assert_eq!(sink.events().len(), 1);
    }
}
