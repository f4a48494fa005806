//! Scene scheduling and conflict resolution for film production planning.
//!
//! Provides the domain model, workflow rules, and scheduling services behind
//! a production-planning backend: scenes move through a shooting lifecycle,
//! get placed on calendar slots, and are checked against resource, weather,
//! and cost rules before a slot is accepted.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Scene`, `SceneStatus`, `ScheduleAssignment`,
//!   `Conflict`, `Severity`
//! - **`workflow`**: Status state machine (pure transition rules)
//! - **`detector`**: Rule-based conflict detection over schedule snapshots
//! - **`scheduler`**: Greedy deterministic auto-scheduler and schedule statistics
//! - **`store`**: Storage, availability, and notification contracts with
//!   in-memory implementations
//! - **`engine`**: The stateful facade — validated transitions, CAS commits,
//!   post-commit events
//! - **`kanban`**: Board-view reconciliation for optimistic drag-and-drop edits
//! - **`error`**: The crate-wide error taxonomy
//!
//! # Architecture
//!
//! Pure logic (workflow, detection, placement, statistics) is separated from
//! effectful orchestration: everything below `engine` computes over values and
//! snapshots, and only `engine` talks to the store. Concurrency is optimistic
//! — every scene record carries a version, writers compare-and-swap, and a
//! stale write surfaces as a retryable error rather than a lock.

pub mod detector;
pub mod engine;
pub mod error;
pub mod kanban;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod workflow;

pub use engine::{AutoScheduleReport, ScheduleEngine, ScheduleFailure};
pub use error::EngineError;
pub use models::{Conflict, Scene, SceneStatus, ScheduleAssignment, Severity};
