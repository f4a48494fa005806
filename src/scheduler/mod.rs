//! Auto-scheduling and schedule statistics.
//!
//! `AutoScheduler` fills unplanned scenes into a calendar window with a
//! greedy, deterministic, single-pass algorithm; `ScheduleStats` is the
//! read-side aggregate backing dashboards. Both operate on snapshots and
//! perform no store writes — [`crate::engine`] applies scheduler output.

mod auto;
mod stats;

pub use auto::{AutoScheduleOutcome, AutoScheduler, CancelToken, ScheduleWindow};
pub use stats::ScheduleStats;
