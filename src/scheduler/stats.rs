//! Schedule statistics.
//!
//! Pure read-side aggregation over a store snapshot for dashboard display.
//! Legacy `"shooting"` data is already collapsed into `InProgress` at the
//! store boundary, so the counts here see a single in-progress bucket.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{AssignmentStatus, SceneStatus};
use crate::store::SceneRecord;

/// Derived scheduling statistics for one project snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    /// All scenes in the snapshot.
    pub total_scenes: usize,
    /// Scenes not yet on the calendar.
    pub unplanned: usize,
    /// Scenes scheduled but not started.
    pub planned: usize,
    /// Scenes currently shooting.
    pub in_progress: usize,
    /// Scenes wrapped.
    pub completed: usize,
    /// Scenes dropped from the schedule.
    pub cancelled: usize,
    /// Scenes occupying a calendar slot (planned + in-progress + completed).
    pub scheduled: usize,
    /// Distinct dates with at least one non-cancelled assignment.
    pub total_shoot_days: usize,
    /// Distinct shoot days whose scenes are all completed.
    pub days_completed: usize,
    /// Completed scenes as an integer percentage of all scenes (floor).
    /// Zero when the snapshot is empty.
    pub completion_percentage: u8,
}

impl ScheduleStats {
    /// Computes statistics from a store snapshot.
    pub fn calculate(records: &[SceneRecord]) -> Self {
        let mut stats = ScheduleStats {
            total_scenes: records.len(),
            ..ScheduleStats::default()
        };

        // Per-date completion tracking: a day is complete once every
        // non-cancelled scene assigned to it has wrapped.
        let mut day_done: BTreeMap<chrono::NaiveDate, bool> = BTreeMap::new();

        for record in records {
            match record.scene.status {
                SceneStatus::Unplanned => stats.unplanned += 1,
                SceneStatus::Planned => stats.planned += 1,
                SceneStatus::InProgress => stats.in_progress += 1,
                SceneStatus::Completed => stats.completed += 1,
                SceneStatus::Cancelled => stats.cancelled += 1,
            }

            if let Some(assignment) = &record.assignment {
                if assignment.status != AssignmentStatus::Cancelled {
                    let completed = record.scene.status == SceneStatus::Completed;
                    day_done
                        .entry(assignment.date)
                        .and_modify(|done| *done &= completed)
                        .or_insert(completed);
                }
            }
        }

        stats.scheduled = stats.planned + stats.in_progress + stats.completed;
        stats.total_shoot_days = day_done.len();
        stats.days_completed = day_done.values().filter(|&&done| done).count();
        stats.completion_percentage = if stats.total_scenes == 0 {
            0
        } else {
            (stats.completed * 100 / stats.total_scenes) as u8
        };

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Scene, ScheduleAssignment};
    use chrono::{NaiveDate, NaiveTime};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    fn record(id: &str, status: SceneStatus, day: Option<&str>) -> SceneRecord {
        let mut scene = Scene::new(id);
        scene.status = status;
        let assignment = day.map(|d| {
            let mut a = ScheduleAssignment::new(id, date(d), time("09:00"), time("11:00"));
            if let Some(status) = AssignmentStatus::mirroring(status) {
                a.status = status;
            }
            a
        });
        SceneRecord {
            scene,
            assignment,
            version: 1,
        }
    }

    #[test]
    fn test_scenario_e_completion_percentage() {
        // 10 scenes: 4 completed, 2 cancelled, 4 other -> 40%.
        let mut records = Vec::new();
        for i in 0..4 {
            records.push(record(&format!("C{i}"), SceneStatus::Completed, Some("2025-03-03")));
        }
        for i in 0..2 {
            records.push(record(&format!("X{i}"), SceneStatus::Cancelled, None));
        }
        for i in 0..4 {
            records.push(record(&format!("U{i}"), SceneStatus::Unplanned, None));
        }

        let stats = ScheduleStats::calculate(&records);
        assert_eq!(stats.total_scenes, 10);
        assert_eq!(stats.completed, 4);
        assert_eq!(stats.cancelled, 2);
        assert_eq!(stats.unplanned, 4);
        assert_eq!(stats.completion_percentage, 40);
    }

    #[test]
    fn test_empty_snapshot_clamps_to_zero() {
        let stats = ScheduleStats::calculate(&[]);
        assert_eq!(stats.total_scenes, 0);
        assert_eq!(stats.completion_percentage, 0);
        assert_eq!(stats.total_shoot_days, 0);
    }

    #[test]
    fn test_percentage_floors() {
        // 1 of 3 completed -> 33, not 34.
        let records = vec![
            record("S1", SceneStatus::Completed, Some("2025-03-03")),
            record("S2", SceneStatus::Planned, Some("2025-03-04")),
            record("S3", SceneStatus::Unplanned, None),
        ];
        let stats = ScheduleStats::calculate(&records);
        assert_eq!(stats.completion_percentage, 33);
    }

    #[test]
    fn test_shoot_days_count_distinct_dates() {
        let records = vec![
            record("S1", SceneStatus::Planned, Some("2025-03-03")),
            record("S2", SceneStatus::Planned, Some("2025-03-03")),
            record("S3", SceneStatus::InProgress, Some("2025-03-04")),
            // Cancelled assignments do not hold a shoot day.
            record("S4", SceneStatus::Cancelled, Some("2025-03-05")),
            record("S5", SceneStatus::Unplanned, None),
        ];
        let stats = ScheduleStats::calculate(&records);
        assert_eq!(stats.total_shoot_days, 2);
        assert_eq!(stats.scheduled, 3);
    }

    #[test]
    fn test_days_completed_requires_whole_day_wrapped() {
        let records = vec![
            // 03-03: fully completed.
            record("S1", SceneStatus::Completed, Some("2025-03-03")),
            record("S2", SceneStatus::Completed, Some("2025-03-03")),
            // 03-04: mixed, not complete.
            record("S3", SceneStatus::Completed, Some("2025-03-04")),
            record("S4", SceneStatus::InProgress, Some("2025-03-04")),
        ];
        let stats = ScheduleStats::calculate(&records);
        assert_eq!(stats.total_shoot_days, 2);
        assert_eq!(stats.days_completed, 1);
    }

    #[test]
    fn test_in_progress_is_one_bucket() {
        // Legacy "shooting" records deserialize as InProgress at the store
        // boundary; a snapshot therefore can only ever contain one bucket.
        let scene: Scene =
            serde_json::from_str(r#"{"id": "S1", "status": "shooting"}"#).unwrap();
        let records = vec![SceneRecord {
            scene,
            assignment: None,
            version: 1,
        }];
        let stats = ScheduleStats::calculate(&records);
        assert_eq!(stats.in_progress, 1);
    }
}
