//! Notification sink port and failure events.

use super::RemoteStoreError;
use crate::task::domain::{Notification, NotificationId, TaskId};
use serde::Serialize;
use std::fmt;

/// Controller intent a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Task creation.
    CreateTask,
    /// Relay leg creation.
    CreateRelayLeg,
    /// Soft delete.
    DeleteTask,
    /// Restore after soft delete.
    RestoreTask,
    /// Generic patch.
    UpdateTask,
    /// Pickup timestamp.
    MarkPickedUp,
    /// Dropoff timestamp.
    MarkDroppedOff,
    /// Cancellation timestamp.
    MarkCancelled,
    /// Rejection timestamp.
    MarkRejected,
    /// Rider returned home.
    MarkRiderHome,
    /// Time of call edit.
    UpdateTimeOfCall,
    /// Requester contact edit.
    UpdateRequesterContact,
    /// Pickup address edit.
    UpdatePickupLocation,
    /// Dropoff address edit.
    UpdateDropoffLocation,
    /// Dropoff address moved between relay legs.
    SetDropoffDestination,
    /// Priority edit.
    UpdatePriority,
    /// Rider responsibility edit.
    UpdateRiderResponsibility,
    /// Rider assignment.
    AssignRider,
    /// Coordinator assignment.
    AssignCoordinator,
    /// Assignment removal.
    Unassign,
    /// Undo of an earlier notification.
    Undo,
    /// Bulk task listing.
    FetchTasks,
    /// Single task fetch.
    FetchTask,
    /// Signed-in user's assigned tasks.
    FetchMyTasks,
    /// Audit timeline fetch.
    LoadAuditLog,
}

impl Intent {
    /// Returns the intent's stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::CreateRelayLeg => "create_relay_leg",
            Self::DeleteTask => "delete_task",
            Self::RestoreTask => "restore_task",
            Self::UpdateTask => "update_task",
            Self::MarkPickedUp => "mark_picked_up",
            Self::MarkDroppedOff => "mark_dropped_off",
            Self::MarkCancelled => "mark_cancelled",
            Self::MarkRejected => "mark_rejected",
            Self::MarkRiderHome => "mark_rider_home",
            Self::UpdateTimeOfCall => "update_time_of_call",
            Self::UpdateRequesterContact => "update_requester_contact",
            Self::UpdatePickupLocation => "update_pickup_location",
            Self::UpdateDropoffLocation => "update_dropoff_location",
            Self::SetDropoffDestination => "set_dropoff_destination",
            Self::UpdatePriority => "update_priority",
            Self::UpdateRiderResponsibility => "update_rider_responsibility",
            Self::AssignRider => "assign_rider",
            Self::AssignCoordinator => "assign_coordinator",
            Self::Unassign => "unassign",
            Self::Undo => "undo",
            Self::FetchTasks => "fetch_tasks",
            Self::FetchTask => "fetch_task",
            Self::FetchMyTasks => "fetch_my_tasks",
            Self::LoadAuditLog => "load_audit_log",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a failed intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The target does not exist.
    NotFound,
    /// The caller lacks permission.
    Forbidden,
    /// Input or state validation failed.
    Validation,
    /// A concurrent write won.
    StaleWrite,
    /// Any other remote failure.
    Remote,
}

impl From<&RemoteStoreError> for FailureKind {
    fn from(err: &RemoteStoreError) -> Self {
        match err {
            RemoteStoreError::NotFound(_) => Self::NotFound,
            RemoteStoreError::Forbidden(_) => Self::Forbidden,
            RemoteStoreError::StaleWrite(_) => Self::StaleWrite,
            RemoteStoreError::Validation(_) => Self::Validation,
            RemoteStoreError::Transport(_) => Self::Remote,
        }
    }
}

/// Failure reported to the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEvent {
    /// Intent that failed.
    pub intent: Intent,
    /// Failure classification.
    pub kind: FailureKind,
    /// Task the intent targeted, when known.
    pub task_id: Option<TaskId>,
    /// Human-readable cause.
    pub message: String,
}

/// Receiver of user-facing notifications and failure events.
pub trait NotificationSink: Send + Sync {
    /// Surfaces a notification.
    fn notify(&self, notification: &Notification);

    /// Reports a failed intent.
    fn failure(&self, event: &FailureEvent);

    /// Signals that a notification was dismissed or consumed.
    fn dismissed(&self, id: NotificationId) {
        let _ = id;
    }
}
