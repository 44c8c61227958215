//! User-facing notifications that carry their own undo actions.

use super::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an active notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Creates a new random notification identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inverse intent re-issued when the user presses undo.
///
/// Undo is a forward mutation: it does not restore the etag or any field
/// changed by other writes in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UndoAction {
    /// Clear `time_picked_up`.
    ClearPickedUp {
        /// Task to update.
        task_id: TaskId,
    },
    /// Clear `time_dropped_off`.
    ClearDroppedOff {
        /// Task to update.
        task_id: TaskId,
    },
    /// Clear `time_cancelled`.
    ClearCancelled {
        /// Task to update.
        task_id: TaskId,
    },
    /// Clear `time_rejected`.
    ClearRejected {
        /// Task to update.
        task_id: TaskId,
    },
    /// Restore a soft-deleted task.
    Restore {
        /// Task to restore.
        task_id: TaskId,
    },
    /// Remove the dropoff destination inherited during a delete.
    UnsetDropoffDestination {
        /// Task that inherited the destination.
        task_id: TaskId,
    },
}

/// Informational message offered to the user, optionally undoable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Text shown to the user.
    pub message: String,
    /// Route to the affected task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_link: Option<String>,
    /// Actions re-issued, in order, on undo.
    pub undo: Vec<UndoAction>,
}

impl Notification {
    /// Creates a notification with undo actions.
    #[must_use]
    pub fn new(message: impl Into<String>, undo: Vec<UndoAction>) -> Self {
        Self {
            id: NotificationId::new(),
            message: message.into(),
            view_link: None,
            undo,
        }
    }

    /// Links the notification to the task view.
    #[must_use]
    pub fn with_task_link(mut self, task_id: TaskId) -> Self {
        self.view_link = Some(format!("/task/{task_id}"));
        self
    }

    /// Returns `true` when the notification offers undo.
    #[must_use]
    pub fn is_undoable(&self) -> bool {
        !self.undo.is_empty()
    }
}
