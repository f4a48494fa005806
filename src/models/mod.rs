//! Scheduling domain models.
//!
//! Core data types for scene scheduling: the scene itself, its calendar
//! assignment, and derived conflicts.
//!
//! # Vocabulary
//!
//! | callsheet | Production office |
//! |-----------|-------------------|
//! | Scene | One slate entry in the shooting script |
//! | Assignment | A line on the day's call sheet |
//! | Conflict | A flag raised during schedule review |

mod assignment;
mod conflict;
mod scene;

pub use assignment::{AssignmentStatus, ScheduleAssignment};
pub use conflict::{sort_canonical, Conflict, ConflictKind, Severity};
pub use scene::{LocationKind, Scene, SceneStatus};
