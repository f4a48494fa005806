//! Kanban board reconciliation.
//!
//! A board front-end renders scenes as cards in five columns, one per
//! [`SceneStatus`]. Dragging a card is an optimistic edit: the view moves the
//! card immediately, then [`KanbanReconciler::move_card`] asks the engine to
//! commit the matching status transition. If the engine rejects the move the
//! view is reverted and the caller receives a [`MoveError`] telling it whether
//! to retry the same move ([`MoveError::Retry`], transient store trouble) or
//! to pick another target ([`MoveError::Rejected`], workflow refusal).
//!
//! Column labels are the canonical kebab-case status names; the legacy
//! `"shooting"` label is accepted on input only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::ScheduleEngine;
use crate::error::EngineError;
use crate::models::{Scene, SceneStatus};
use crate::store::{NotificationSink, ResourceDirectory, SceneRecord, SceneStore};

/// One board column. Columns map one-to-one onto scene statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KanbanColumn {
    Unplanned,
    Planned,
    #[serde(alias = "shooting")]
    InProgress,
    Completed,
    Cancelled,
}

impl KanbanColumn {
    /// All columns in board order.
    pub const ALL: [KanbanColumn; 5] = [
        KanbanColumn::Unplanned,
        KanbanColumn::Planned,
        KanbanColumn::InProgress,
        KanbanColumn::Completed,
        KanbanColumn::Cancelled,
    ];

    /// The canonical column label.
    pub fn label(&self) -> &'static str {
        match self {
            KanbanColumn::Unplanned => "unplanned",
            KanbanColumn::Planned => "planned",
            KanbanColumn::InProgress => "in-progress",
            KanbanColumn::Completed => "completed",
            KanbanColumn::Cancelled => "cancelled",
        }
    }

    /// Parses a column label. Accepts the legacy `"shooting"` spelling for
    /// the in-progress column; every other unknown label is `None`.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label {
            "unplanned" => Some(KanbanColumn::Unplanned),
            "planned" => Some(KanbanColumn::Planned),
            "in-progress" | "shooting" => Some(KanbanColumn::InProgress),
            "completed" => Some(KanbanColumn::Completed),
            "cancelled" => Some(KanbanColumn::Cancelled),
            _ => None,
        }
    }

    /// The scene status this column displays.
    pub fn status(&self) -> SceneStatus {
        match self {
            KanbanColumn::Unplanned => SceneStatus::Unplanned,
            KanbanColumn::Planned => SceneStatus::Planned,
            KanbanColumn::InProgress => SceneStatus::InProgress,
            KanbanColumn::Completed => SceneStatus::Completed,
            KanbanColumn::Cancelled => SceneStatus::Cancelled,
        }
    }
}

impl From<SceneStatus> for KanbanColumn {
    fn from(status: SceneStatus) -> Self {
        match status {
            SceneStatus::Unplanned => KanbanColumn::Unplanned,
            SceneStatus::Planned => KanbanColumn::Planned,
            SceneStatus::InProgress => KanbanColumn::InProgress,
            SceneStatus::Completed => KanbanColumn::Completed,
            SceneStatus::Cancelled => KanbanColumn::Cancelled,
        }
    }
}

impl fmt::Display for KanbanColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scene ids grouped by column, in insertion order within each column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    columns: BTreeMap<KanbanColumn, Vec<String>>,
}

impl BoardView {
    /// Builds a view from a store snapshot.
    pub fn from_records(records: &[SceneRecord]) -> Self {
        let mut view = BoardView::default();
        for record in records {
            view.columns
                .entry(record.scene.status.into())
                .or_default()
                .push(record.scene.id.clone());
        }
        view
    }

    /// The scene ids in one column.
    pub fn column(&self, column: KanbanColumn) -> &[String] {
        self.columns.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds the column currently holding a scene.
    pub fn column_of(&self, scene_id: &str) -> Option<KanbanColumn> {
        self.columns
            .iter()
            .find(|(_, ids)| ids.iter().any(|id| id == scene_id))
            .map(|(column, _)| *column)
    }

    fn move_entry(&mut self, scene_id: &str, from: KanbanColumn, to: KanbanColumn) {
        if let Some(ids) = self.columns.get_mut(&from) {
            ids.retain(|id| id != scene_id);
        }
        self.columns
            .entry(to)
            .or_default()
            .push(scene_id.to_string());
    }
}

/// Why a card move did not stick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoveError {
    /// A transient store failure. The view has been reverted; the same move
    /// can be retried as-is.
    #[error("move deferred by a transient store failure, retry: {0}")]
    Retry(EngineError),
    /// The workflow refused the move. The view has been reverted; pick a
    /// different target column.
    #[error("move rejected: {0}")]
    Rejected(EngineError),
}

/// Reconciles optimistic board edits with the engine.
pub struct KanbanReconciler<'a, S, D, N> {
    engine: &'a ScheduleEngine<S, D, N>,
}

impl<'a, S, D, N> KanbanReconciler<'a, S, D, N>
where
    S: SceneStore,
    D: ResourceDirectory,
    N: NotificationSink,
{
    pub fn new(engine: &'a ScheduleEngine<S, D, N>) -> Self {
        Self { engine }
    }

    /// Moves a card to `target`, committing the matching status transition.
    ///
    /// The view is updated before the engine is consulted so the board never
    /// lags a successful commit. On any failure the card is put back where it
    /// was and the error is classified for the caller.
    pub fn move_card(
        &self,
        view: &mut BoardView,
        scene_id: &str,
        target: KanbanColumn,
    ) -> Result<Scene, MoveError> {
        let from = view.column_of(scene_id).ok_or_else(|| {
            MoveError::Rejected(EngineError::SceneNotFound {
                scene_id: scene_id.to_string(),
            })
        })?;

        view.move_entry(scene_id, from, target);
        match self.engine.transition(scene_id, target.status()) {
            Ok(scene) => Ok(scene),
            Err(error) => {
                view.move_entry(scene_id, target, from);
                if error.is_retryable() {
                    Err(MoveError::Retry(error))
                } else {
                    Err(MoveError::Rejected(error))
                }
            }
        }
    }
}
