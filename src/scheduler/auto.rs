//! Greedy auto-scheduler.
//!
//! Batch-assigns unscheduled scenes to dates in a calendar window, packing
//! each shoot day up to a minute budget and consulting the conflict detector
//! for every trial placement.
//!
//! # Algorithm
//!
//! 1. Order scenes by required-actor count descending (hardest to place
//!    first), ties by ascending scene id.
//! 2. Walk window dates in order, tracking cumulative allocated minutes per
//!    date (seeded from the snapshot's existing non-cancelled assignments).
//! 3. Place each scene on the first date with enough remaining budget where
//!    the trial block produces zero High-severity conflicts. Medium/Low
//!    conflicts are tolerated and recorded.
//! 4. Scenes with no feasible date go to `unplaced`.
//!
//! Given the same scene set, window, and existing assignments, two runs
//! produce identical output.
//!
//! # Complexity
//! O(n * d * e) where n=scenes, d=window days, e=snapshot entries.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::detector::{ConflictDetector, PlacementCandidate, ScheduleSnapshot, SnapshotEntry};
use crate::models::{AssignmentStatus, Conflict, Scene, ScheduleAssignment};
use crate::store::ResourceDirectory;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Inclusive calendar window for auto-scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    /// First candidate shoot date.
    pub start: NaiveDate,
    /// Last candidate shoot date (inclusive).
    pub end: NaiveDate,
}

impl ScheduleWindow {
    /// Creates a window. An inverted window contains no days.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Iterates the window's dates in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let mut current = Some(self.start);
        let end = self.end;
        std::iter::from_fn(move || {
            let date = current.filter(|d| *d <= end)?;
            current = date.checked_add_days(Days::new(1));
            Some(date)
        })
    }
}

/// Cooperative cancellation flag for long auto-schedule runs.
///
/// Checked between scene placements, never mid-rule-evaluation. On
/// cancellation the run returns the placements made so far and reports the
/// remaining scenes as unplaced.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one auto-schedule computation.
#[derive(Debug, Clone, Default)]
pub struct AutoScheduleOutcome {
    /// Proposed assignments, in placement order. All `Planned`.
    pub placements: Vec<ScheduleAssignment>,
    /// Scenes that could not be placed in the window.
    pub unplaced: Vec<String>,
    /// Tolerated (Medium/Low) conflicts recorded during placement.
    pub conflicts: Vec<Conflict>,
}

/// Deterministic greedy scheduler for unplanned scenes.
#[derive(Debug, Clone)]
pub struct AutoScheduler {
    day_start: NaiveTime,
    default_duration_minutes: u32,
    skip_weekends: bool,
    detector: ConflictDetector,
}

impl Default for AutoScheduler {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            default_duration_minutes: 240,
            skip_weekends: false,
            detector: ConflictDetector::new(),
        }
    }
}

impl AutoScheduler {
    /// Creates a scheduler with defaults: day start 09:00, 240-minute
    /// fallback duration, weekends allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time of day the first slot of each date begins.
    pub fn with_day_start(mut self, day_start: NaiveTime) -> Self {
        self.day_start = day_start;
        self
    }

    /// Sets the duration assumed for scenes with no estimate.
    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Skips the detector's configured weekend days entirely instead of
    /// merely flagging them as cost conflicts.
    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    /// Sets the conflict detector used for trial placements.
    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Places `scenes` into `window`, packing each date up to
    /// `day_budget_minutes`.
    ///
    /// Pure computation over the snapshot: no store writes. Trial placements
    /// see both existing assignments and placements accepted earlier in the
    /// same run.
    pub fn schedule(
        &self,
        scenes: &[Scene],
        window: ScheduleWindow,
        day_budget_minutes: u32,
        snapshot: &ScheduleSnapshot,
        directory: &dyn ResourceDirectory,
        cancel: &CancelToken,
    ) -> AutoScheduleOutcome {
        let mut outcome = AutoScheduleOutcome::default();
        let mut working = snapshot.clone();

        // Seed per-date budgets with what the snapshot already holds.
        let mut allocated: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for date in window.days() {
            let used: u32 = working.active_on(date).map(entry_minutes).sum();
            allocated.insert(date, used);
        }

        let order = self.priority_order(scenes);

        for (position, &idx) in order.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!(remaining = order.len() - position, "auto-schedule cancelled");
                outcome
                    .unplaced
                    .extend(order[position..].iter().map(|&i| scenes[i].id.clone()));
                break;
            }

            let scene = &scenes[idx];
            let duration = scene
                .estimated_duration_minutes
                .unwrap_or(self.default_duration_minutes);

            match self.place_scene(scene, duration, window, day_budget_minutes, &allocated, &working, directory) {
                Some((candidate, tolerated)) => {
                    debug!(
                        scene_id = %scene.id,
                        date = %candidate.date,
                        start = %candidate.start_time,
                        "scene placed"
                    );
                    *allocated.entry(candidate.date).or_insert(0) += duration;
                    working.push(SnapshotEntry {
                        scene_id: candidate.scene_id.clone(),
                        date: candidate.date,
                        start_time: candidate.start_time,
                        end_time: candidate.end_time,
                        status: AssignmentStatus::Planned,
                        location_kind: candidate.location_kind,
                        actors: candidate.actors.clone(),
                        resources: candidate.resources.clone(),
                    });
                    outcome.conflicts.extend(tolerated);
                    outcome.placements.push(ScheduleAssignment::new(
                        candidate.scene_id,
                        candidate.date,
                        candidate.start_time,
                        candidate.end_time,
                    ));
                }
                None => {
                    debug!(scene_id = %scene.id, "no feasible date in window");
                    outcome.unplaced.push(scene.id.clone());
                }
            }
        }

        outcome
    }

    /// Scene indices in placement order: more required actors first, ties by
    /// ascending id.
    fn priority_order(&self, scenes: &[Scene]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..scenes.len()).collect();
        indices.sort_by(|&a, &b| {
            scenes[b]
                .required_actors
                .len()
                .cmp(&scenes[a].required_actors.len())
                .then_with(|| scenes[a].id.cmp(&scenes[b].id))
        });
        indices
    }

    /// Finds the first feasible date for a scene, returning the accepted
    /// candidate and the tolerated conflicts it carries.
    #[allow(clippy::too_many_arguments)]
    fn place_scene(
        &self,
        scene: &Scene,
        duration: u32,
        window: ScheduleWindow,
        day_budget_minutes: u32,
        allocated: &BTreeMap<NaiveDate, u32>,
        working: &ScheduleSnapshot,
        directory: &dyn ResourceDirectory,
    ) -> Option<(PlacementCandidate, Vec<Conflict>)> {
        let day_start_minutes =
            self.day_start.signed_duration_since(NaiveTime::MIN).num_minutes() as u32;

        for date in window.days() {
            if self.skip_weekends
                && self
                    .detector
                    .config()
                    .weekend_days
                    .contains(&date.weekday())
            {
                continue;
            }

            let used = allocated.get(&date).copied().unwrap_or(0);
            if used + duration > day_budget_minutes {
                continue;
            }

            let start_minutes = day_start_minutes + used;
            let end_minutes = start_minutes + duration;
            if end_minutes >= MINUTES_PER_DAY {
                // The block would run past midnight; this date cannot hold it.
                continue;
            }
            let start = NaiveTime::from_num_seconds_from_midnight_opt(start_minutes * 60, 0)?;
            let end = NaiveTime::from_num_seconds_from_midnight_opt(end_minutes * 60, 0)?;

            let candidate = PlacementCandidate::for_scene(scene, date, start, end);
            let conflicts = self.detector.detect(&candidate, working, directory);
            if conflicts.iter().any(Conflict::is_blocking) {
                continue;
            }
            return Some((candidate, conflicts));
        }

        None
    }
}

fn entry_minutes(entry: &SnapshotEntry) -> u32 {
    (entry.end_time - entry.start_time).num_minutes().max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictKind, LocationKind};
    use crate::store::NoAvailabilityData;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    fn window(start: &str, end: &str) -> ScheduleWindow {
        ScheduleWindow::new(date(start), date(end))
    }

    fn run(
        scheduler: &AutoScheduler,
        scenes: &[Scene],
        win: ScheduleWindow,
        budget: u32,
    ) -> AutoScheduleOutcome {
        scheduler.schedule(
            scenes,
            win,
            budget,
            &ScheduleSnapshot::new(),
            &NoAvailabilityData,
            &CancelToken::new(),
        )
    }

    #[test]
    fn test_scenario_d_day_budget_overflow() {
        // Three 240-minute scenes into 480-minute days: two on day one,
        // the third rolls to the next day.
        let scenes = vec![
            Scene::new("S1").with_duration_minutes(240),
            Scene::new("S2").with_duration_minutes(240),
            Scene::new("S3").with_duration_minutes(240),
        ];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-04"),
            480,
        );

        assert_eq!(outcome.placements.len(), 3);
        assert!(outcome.unplaced.is_empty());
        assert_eq!(outcome.placements[0].date, date("2025-03-03"));
        assert_eq!(outcome.placements[0].start_time, time("09:00"));
        assert_eq!(outcome.placements[1].date, date("2025-03-03"));
        assert_eq!(outcome.placements[1].start_time, time("13:00"));
        assert_eq!(outcome.placements[2].date, date("2025-03-04"));
        assert_eq!(outcome.placements[2].start_time, time("09:00"));
    }

    #[test]
    fn test_scenario_d_window_exhausted() {
        let scenes = vec![
            Scene::new("S1").with_duration_minutes(240),
            Scene::new("S2").with_duration_minutes(240),
            Scene::new("S3").with_duration_minutes(240),
        ];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
        );

        assert_eq!(outcome.placements.len(), 2);
        assert_eq!(outcome.unplaced, vec!["S3"]);
    }

    #[test]
    fn test_harder_scenes_place_first() {
        let scenes = vec![
            Scene::new("S1").with_duration_minutes(60),
            Scene::new("S2")
                .with_duration_minutes(60)
                .with_actor("A1")
                .with_actor("A2"),
            Scene::new("S3").with_duration_minutes(60).with_actor("A1"),
        ];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
        );

        let order: Vec<_> = outcome
            .placements
            .iter()
            .map(|p| p.scene_id.as_str())
            .collect();
        assert_eq!(order, vec!["S2", "S3", "S1"]);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let scenes = vec![
            Scene::new("S9").with_duration_minutes(60),
            Scene::new("S1").with_duration_minutes(60),
            Scene::new("S5").with_duration_minutes(60),
        ];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
        );

        let order: Vec<_> = outcome
            .placements
            .iter()
            .map(|p| p.scene_id.as_str())
            .collect();
        assert_eq!(order, vec!["S1", "S5", "S9"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let scenes = vec![
            Scene::new("S1").with_actor("A1").with_duration_minutes(120),
            Scene::new("S2").with_actor("A1").with_duration_minutes(120),
            Scene::new("S3")
                .with_location_kind(LocationKind::Outdoor)
                .with_duration_minutes(300),
        ];
        let scheduler = AutoScheduler::new();
        let win = window("2025-03-03", "2025-03-05");

        let first = run(&scheduler, &scenes, win, 360);
        let second = run(&scheduler, &scenes, win, 360);
        assert_eq!(first.placements, second.placements);
        assert_eq!(first.unplaced, second.unplaced);
        assert_eq!(first.conflicts, second.conflicts);
    }

    #[test]
    fn test_unknown_duration_defaults_to_240() {
        let scenes = vec![Scene::new("S1")];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
        );
        assert_eq!(outcome.placements[0].duration_minutes(), 240);
    }

    #[test]
    fn test_blocking_conflict_pushes_to_next_date() {
        // S1 already holds 10:00-12:00 on day one with actor A1. The new
        // scene's trial block (11:00 after the 120 allocated minutes) would
        // overlap it, so the scene lands on day two.
        let snapshot = ScheduleSnapshot::new().with_entry(SnapshotEntry {
            scene_id: "S1".into(),
            date: date("2025-03-03"),
            start_time: time("10:00"),
            end_time: time("12:00"),
            status: AssignmentStatus::Planned,
            location_kind: LocationKind::Indoor,
            actors: ["A1".to_string()].into(),
            resources: Default::default(),
        });
        let scenes = vec![Scene::new("S2").with_actor("A1").with_duration_minutes(240)];

        let outcome = AutoScheduler::new().schedule(
            &scenes,
            window("2025-03-03", "2025-03-04"),
            480,
            &snapshot,
            &NoAvailabilityData,
            &CancelToken::new(),
        );

        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].date, date("2025-03-04"));
    }

    #[test]
    fn test_tolerated_conflicts_recorded() {
        let scenes = vec![Scene::new("S1")
            .with_location_kind(LocationKind::Outdoor)
            .with_duration_minutes(120)];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
        );

        // Placed despite the Medium weather risk, which is recorded.
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].kind, ConflictKind::WeatherRisk);
    }

    #[test]
    fn test_skip_weekends() {
        // 2025-03-01 is a Saturday; with skipping on, the first slot is
        // Monday the 3rd.
        let scenes = vec![Scene::new("S1").with_duration_minutes(120)];
        let scheduler = AutoScheduler::new().with_skip_weekends(true);
        let outcome = run(&scheduler, &scenes, window("2025-03-01", "2025-03-04"), 480);

        assert_eq!(outcome.placements[0].date, date("2025-03-03"));

        // Without skipping, Saturday is used (and flagged as weekend cost).
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-01", "2025-03-04"),
            480,
        );
        assert_eq!(outcome.placements[0].date, date("2025-03-01"));
        assert_eq!(outcome.conflicts[0].kind, ConflictKind::WeekendCost);
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let scenes = vec![
            Scene::new("S1").with_duration_minutes(60),
            Scene::new("S2").with_duration_minutes(60),
        ];
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = AutoScheduler::new().schedule(
            &scenes,
            window("2025-03-03", "2025-03-05"),
            480,
            &ScheduleSnapshot::new(),
            &NoAvailabilityData,
            &cancel,
        );

        assert!(outcome.placements.is_empty());
        assert_eq!(outcome.unplaced, vec!["S1", "S2"]);
    }

    #[test]
    fn test_budget_seeded_from_existing_assignments() {
        // Day one already carries 240 minutes; only one more 240-minute
        // scene fits under the 480 budget.
        let snapshot = ScheduleSnapshot::new().with_entry(SnapshotEntry {
            scene_id: "S0".into(),
            date: date("2025-03-03"),
            start_time: time("09:00"),
            end_time: time("13:00"),
            status: AssignmentStatus::Planned,
            location_kind: LocationKind::Indoor,
            actors: Default::default(),
            resources: Default::default(),
        });
        let scenes = vec![
            Scene::new("S1").with_duration_minutes(240),
            Scene::new("S2").with_duration_minutes(240),
        ];

        let outcome = AutoScheduler::new().schedule(
            &scenes,
            window("2025-03-03", "2025-03-03"),
            480,
            &snapshot,
            &NoAvailabilityData,
            &CancelToken::new(),
        );

        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].scene_id, "S1");
        assert_eq!(outcome.placements[0].start_time, time("13:00"));
        assert_eq!(outcome.unplaced, vec!["S2"]);
    }

    #[test]
    fn test_empty_window() {
        let scenes = vec![Scene::new("S1")];
        let outcome = run(
            &AutoScheduler::new(),
            &scenes,
            window("2025-03-05", "2025-03-03"),
            480,
        );
        assert!(outcome.placements.is_empty());
        assert_eq!(outcome.unplaced, vec!["S1"]);
    }
}
