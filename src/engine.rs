//! Scheduling engine.
//!
//! Ties the pure pieces together against the collaborator contracts: loads a
//! scene, validates the requested change with [`crate::workflow`], commits
//! scene and assignment together under CAS, and publishes events after the
//! commit. Consumers follow a single-writer-per-scene discipline; a stale
//! write surfaces as a retryable [`EngineError::VersionConflict`].
//!
//! Batch auto-scheduling is two-phase: a pure computation over a read
//! snapshot, then one individual transition per placement. A scene that
//! moved between snapshot and write is dropped and reported, never forced.

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::detector::{ConflictDetector, PlacementCandidate, ScheduleSnapshot};
use crate::error::EngineError;
use crate::models::{AssignmentStatus, Conflict, Scene, SceneStatus, ScheduleAssignment};
use crate::scheduler::{AutoScheduler, CancelToken, ScheduleStats, ScheduleWindow};
use crate::store::{EngineEvent, NotificationSink, ResourceDirectory, SceneStore};
use crate::workflow;

/// One placement that could not be written back during a batch apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFailure {
    /// Scene whose write failed.
    pub scene_id: String,
    /// The transient error. Retrying the batch will pick the scene up again.
    pub error: EngineError,
}

/// Result of an applied auto-schedule run.
#[derive(Debug, Clone, Default)]
pub struct AutoScheduleReport {
    /// Scenes successfully placed and transitioned to `Planned`.
    pub scheduled: Vec<Scene>,
    /// Scenes with no feasible placement, plus scenes dropped because they
    /// left `Unplanned` between snapshot and write.
    pub unplaced: Vec<String>,
    /// Tolerated (Medium/Low) conflicts recorded during placement.
    pub conflicts: Vec<Conflict>,
    /// Per-scene transient write failures.
    pub failures: Vec<ScheduleFailure>,
}

/// The scheduling engine facade.
pub struct ScheduleEngine<S, D, N> {
    store: S,
    directory: D,
    sink: N,
    detector: ConflictDetector,
    scheduler: AutoScheduler,
}

impl<S, D, N> ScheduleEngine<S, D, N>
where
    S: SceneStore,
    D: ResourceDirectory,
    N: NotificationSink,
{
    /// Creates an engine over the given collaborators with default detector
    /// and scheduler settings.
    pub fn new(store: S, directory: D, sink: N) -> Self {
        Self {
            store,
            directory,
            sink,
            detector: ConflictDetector::new(),
            scheduler: AutoScheduler::new(),
        }
    }

    /// Replaces the conflict detector.
    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Replaces the auto-scheduler.
    pub fn with_scheduler(mut self, scheduler: AutoScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// The underlying scene store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Moves a scene to `target` status.
    ///
    /// Scene status and the mirrored assignment status commit together:
    /// either both change or neither does. On success a `StatusChanged`
    /// event is published fire-and-forget.
    pub fn transition(&self, scene_id: &str, target: SceneStatus) -> Result<Scene, EngineError> {
        let record = self.store.get(scene_id)?;
        let from = record.scene.status;
        workflow::validate(scene_id, from, target, record.assignment.as_ref())?;

        let mut scene = record.scene;
        scene.status = target;
        let assignment = match target {
            // Regression to the backlog releases the slot entirely.
            SceneStatus::Unplanned => None,
            _ => record.assignment.map(|mut a| {
                if let Some(status) = AssignmentStatus::mirroring(target) {
                    a.status = status;
                }
                a
            }),
        };

        self.store.save(scene.clone(), assignment, record.version)?;
        info!(scene_id, %from, to = %target, "scene status changed");
        self.sink.publish(EngineEvent::StatusChanged {
            scene_id: scene_id.to_string(),
            from,
            to: target,
        });
        Ok(scene)
    }

    /// Places (or re-places) a scene on the calendar.
    ///
    /// The assignment is recreated, never mutated in place. An unplanned or
    /// cancelled scene is activated to `Planned` in the same commit; a
    /// planned or in-progress scene keeps its status and only moves slots.
    /// Completed scenes cannot be rescheduled.
    pub fn schedule_scene(
        &self,
        scene_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        notes: &str,
    ) -> Result<Scene, EngineError> {
        let record = self.store.get(scene_id)?;
        let mut assignment =
            ScheduleAssignment::new(scene_id, date, start, end).with_notes(notes);
        assignment.validate()?;

        let from = record.scene.status;
        let mut scene = record.scene;
        let activated = match from {
            SceneStatus::Unplanned | SceneStatus::Cancelled => {
                workflow::validate(scene_id, from, SceneStatus::Planned, Some(&assignment))?;
                scene.status = SceneStatus::Planned;
                true
            }
            SceneStatus::Planned | SceneStatus::InProgress => {
                if let Some(status) = AssignmentStatus::mirroring(from) {
                    assignment.status = status;
                }
                false
            }
            SceneStatus::Completed => {
                return Err(EngineError::InvalidTransition {
                    from: SceneStatus::Completed,
                    to: SceneStatus::Planned,
                })
            }
        };

        self.store
            .save(scene.clone(), Some(assignment), record.version)?;
        debug!(scene_id, %date, "scene placed on calendar");
        if activated {
            self.sink.publish(EngineEvent::StatusChanged {
                scene_id: scene_id.to_string(),
                from,
                to: SceneStatus::Planned,
            });
        }
        self.sink.publish(EngineEvent::SceneRescheduled {
            scene_id: scene_id.to_string(),
            date,
        });
        Ok(scene)
    }

    /// Returns a planned scene to the backlog, removing its assignment.
    pub fn unschedule(&self, scene_id: &str) -> Result<Scene, EngineError> {
        self.transition(scene_id, SceneStatus::Unplanned)
    }

    /// Conflicts for one scene's current assignment.
    pub fn detect_for(&self, scene_id: &str) -> Result<Vec<Conflict>, EngineError> {
        let record = self.store.get(scene_id)?;
        let assignment = record
            .assignment
            .as_ref()
            .ok_or_else(|| EngineError::MissingOrInvalidAssignment {
                scene_id: scene_id.to_string(),
            })?;
        let candidate = PlacementCandidate::for_scene(
            &record.scene,
            assignment.date,
            assignment.start_time,
            assignment.end_time,
        );
        let snapshot = ScheduleSnapshot::from_records(&self.store.list()?);
        Ok(self.detector.detect(&candidate, &snapshot, &self.directory))
    }

    /// Conflicts across the whole current schedule.
    pub fn scan_conflicts(&self) -> Result<Vec<Conflict>, EngineError> {
        let snapshot = ScheduleSnapshot::from_records(&self.store.list()?);
        Ok(self.detector.scan(&snapshot, &self.directory))
    }

    /// Scheduling statistics for the current snapshot.
    pub fn stats(&self) -> Result<ScheduleStats, EngineError> {
        Ok(ScheduleStats::calculate(&self.store.list()?))
    }

    /// Fills unplanned scenes into `window` and applies the placements.
    ///
    /// Phase one computes placements over a read snapshot; phase two writes
    /// each placement as an individual `Unplanned -> Planned` transition.
    /// Scenes that left `Unplanned` (or disappeared) in between are dropped
    /// to `unplaced`; transient store errors are recorded per scene in
    /// `failures` without aborting the rest of the batch.
    pub fn auto_schedule(
        &self,
        window: ScheduleWindow,
        day_budget_minutes: u32,
        cancel: &CancelToken,
    ) -> Result<AutoScheduleReport, EngineError> {
        let records = self.store.list()?;
        let snapshot = ScheduleSnapshot::from_records(&records);
        let unplanned: Vec<Scene> = records
            .iter()
            .filter(|r| r.scene.status == SceneStatus::Unplanned)
            .map(|r| r.scene.clone())
            .collect();

        let outcome = self.scheduler.schedule(
            &unplanned,
            window,
            day_budget_minutes,
            &snapshot,
            &self.directory,
            cancel,
        );

        let mut report = AutoScheduleReport {
            unplaced: outcome.unplaced,
            conflicts: outcome.conflicts,
            ..AutoScheduleReport::default()
        };

        for placement in outcome.placements {
            let scene_id = placement.scene_id.clone();
            match self.apply_placement(placement) {
                Ok(Some(scene)) => report.scheduled.push(scene),
                Ok(None) => {
                    warn!(%scene_id, "scene moved since snapshot; placement dropped");
                    report.unplaced.push(scene_id);
                }
                Err(error) if error.is_retryable() => {
                    warn!(%scene_id, %error, "placement write failed");
                    report.failures.push(ScheduleFailure { scene_id, error });
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            scheduled = report.scheduled.len(),
            unplaced = report.unplaced.len(),
            failures = report.failures.len(),
            "auto-schedule applied"
        );
        Ok(report)
    }

    /// Writes one placement. `Ok(None)` means the scene is no longer
    /// eligible and the placement should be dropped.
    fn apply_placement(
        &self,
        placement: ScheduleAssignment,
    ) -> Result<Option<Scene>, EngineError> {
        let record = match self.store.get(&placement.scene_id) {
            Ok(record) => record,
            Err(EngineError::SceneNotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        if record.scene.status != SceneStatus::Unplanned {
            return Ok(None);
        }

        let from = record.scene.status;
        let mut scene = record.scene;
        scene.status = SceneStatus::Planned;
        let date = placement.date;
        self.store
            .save(scene.clone(), Some(placement), record.version)?;

        self.sink.publish(EngineEvent::StatusChanged {
            scene_id: scene.id.clone(),
            from,
            to: SceneStatus::Planned,
        });
        self.sink.publish(EngineEvent::SceneRescheduled {
            scene_id: scene.id.clone(),
            date,
        });
        Ok(Some(scene))
    }
}
