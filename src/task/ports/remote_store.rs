//! Remote task store port: task CRUD, assignments and destinations.

use crate::task::domain::{
    AssigneeRole, AssignmentId, Etag, Location, ParentId, Priority, RequesterContact, Task,
    TaskAssignee, TaskId, TaskPatch, TaskStatus, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for remote collaborator calls.
pub type RemoteStoreResult<T> = Result<T, RemoteStoreError>;

/// Payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTaskPayload {
    /// Requester contact details.
    pub requester_contact: RequesterContact,
    /// Delivery priority.
    pub priority: Option<Priority>,
    /// Time the delivery was requested.
    pub time_of_call: Option<DateTime<Utc>>,
    /// Pickup address.
    pub pickup_location: Option<Location>,
    /// Dropoff address.
    pub dropoff_location: Option<Location>,
    /// Relay the new task joins, if already grouped.
    pub parent_id: Option<ParentId>,
    /// Leg the new task continues from.
    pub relay_previous_uuid: Option<TaskId>,
}

/// Store response to a task creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedTask {
    /// Identifier assigned by the store.
    pub id: TaskId,
    /// Display reference code.
    pub reference: Option<String>,
    /// Relay grouping id assigned by the store.
    pub parent_id: Option<ParentId>,
    /// Position assigned within the relay.
    pub order_in_relay: Option<u32>,
    /// User recorded as the author.
    pub author_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Initial concurrency token.
    pub etag: Etag,
}

/// Sort direction for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

/// Filter for one page of a per-status task listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskQuery {
    /// User whose assignments are listed.
    pub user_id: UserId,
    /// Whether to search archived tasks.
    pub archived: bool,
    /// Role the user holds on the listed tasks.
    pub role: AssigneeRole,
    /// Status to list.
    pub status: TaskStatus,
    /// Pagination cursor.
    pub cursor: Option<String>,
    /// Sort direction by creation time.
    pub sort: SortDirection,
}

/// Rider responsibility label recorded against a task assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Responsibility label.
    pub patch: String,
    /// Identifier of the label in the store.
    pub patch_id: Option<u64>,
}

/// Remote task store contract.
#[async_trait]
pub trait TaskRemoteStore: Send + Sync {
    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError`] when the store rejects the payload or is
    /// unreachable.
    async fn create_task(&self, payload: &NewTaskPayload) -> RemoteStoreResult<CreatedTask>;

    /// Applies a partial update guarded by the caller's latest etag.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::StaleWrite`] when `etag` is outdated and
    /// [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn update_task(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        etag: Option<Etag>,
    ) -> RemoteStoreResult<Etag>;

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist or
    /// is deleted.
    async fn get_task(&self, id: TaskId) -> RemoteStoreResult<Task>;

    /// Lists tasks matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError`] when the listing fails.
    async fn get_tasks(&self, query: &TaskQuery) -> RemoteStoreResult<Vec<Task>>;

    /// Soft-deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn delete_task(&self, id: TaskId) -> RemoteStoreResult<()>;

    /// Restores a soft-deleted task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn restore_task(&self, id: TaskId) -> RemoteStoreResult<()>;

    /// Lists rider responsibility records for a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError`] when the listing fails.
    async fn get_task_assigned_riders(&self, id: TaskId) -> RemoteStoreResult<Vec<PatchRecord>>;

    /// Sets the pickup destination.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn set_pickup_destination(
        &self,
        id: TaskId,
        location: &Location,
    ) -> RemoteStoreResult<Etag>;

    /// Sets the dropoff destination.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn set_dropoff_destination(
        &self,
        id: TaskId,
        location: &Location,
    ) -> RemoteStoreResult<Etag>;

    /// Clears the dropoff destination.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn unset_dropoff_destination(&self, id: TaskId) -> RemoteStoreResult<Etag>;

    /// Stores a new assignment.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the task does not exist.
    async fn add_assignee(&self, assignment: &TaskAssignee) -> RemoteStoreResult<()>;

    /// Deletes an assignment and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the assignment does not
    /// exist.
    async fn remove_assignee(&self, id: AssignmentId) -> RemoteStoreResult<TaskAssignee>;

    /// Lists the assignments of a task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError`] when the listing fails.
    async fn list_assignees(&self, task_id: TaskId) -> RemoteStoreResult<Vec<TaskAssignee>>;
}

/// Errors returned by remote collaborators.
#[derive(Debug, Clone, Error)]
pub enum RemoteStoreError {
    /// The requested record does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller may not access the record (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The write carried an outdated concurrency token (409/412).
    #[error("stale write rejected: {0}")]
    StaleWrite(String),

    /// The store rejected the payload (400/422).
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Network or server failure.
    #[error("remote store failure: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl RemoteStoreError {
    /// Wraps a transport-level error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Classifies an HTTP failure status.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_relay::task::ports::RemoteStoreError;
    ///
    /// assert!(matches!(
    ///     RemoteStoreError::from_status(404, "no such task"),
    ///     RemoteStoreError::NotFound(_)
    /// ));
    /// assert!(matches!(
    ///     RemoteStoreError::from_status(503, "unavailable"),
    ///     RemoteStoreError::Transport(_)
    /// ));
    /// ```
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            403 => Self::Forbidden(message),
            409 | 412 => Self::StaleWrite(message),
            400 | 422 => Self::Validation(message),
            _ => Self::transport(std::io::Error::other(format!("HTTP {status}: {message}"))),
        }
    }
}
