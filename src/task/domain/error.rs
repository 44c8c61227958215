//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while validating task intents against current task state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task is not present in the local collection.
    #[error("task {0} is not known locally")]
    UnknownTask(TaskId),

    /// The task is cancelled, rejected or deleted and cannot take new riders.
    #[error("task {task_id} is closed ({status}) and cannot be assigned")]
    TaskClosed {
        /// Task that rejected the intent.
        task_id: TaskId,
        /// Status held by the task at validation time.
        status: TaskStatus,
    },

    /// The task is soft-deleted and cannot be mutated until restored.
    #[error("task {0} is deleted")]
    TaskDeleted(TaskId),

    /// The task is not soft-deleted, so there is nothing to restore.
    #[error("task {0} is not deleted")]
    TaskNotDeleted(TaskId),

    /// Completed tasks cannot be deleted.
    #[error("task {0} is completed and cannot be deleted")]
    TaskCompleted(TaskId),

    /// The requested status change is not permitted by the lifecycle.
    #[error("cannot move task from {from} to {to}")]
    InvalidStateTransition {
        /// Current task status.
        from: TaskStatus,
        /// Requested task status.
        to: TaskStatus,
    },

    /// Milestone times and the statuses they drive go through the mark
    /// intents, which keep relays linked and notifications flowing.
    #[error("patch for task {0} carries a milestone; use the matching mark intent")]
    MilestoneInPatch(TaskId),

    /// A patch without any fields was submitted.
    #[error("patch for task {0} changes nothing")]
    EmptyPatch(TaskId),
}

/// Error returned while parsing task statuses from wire values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing assignee roles from wire values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown assignee role: {0}")]
pub struct ParseAssigneeRoleError(pub String);
