//! Task record, lifecycle status and priority.

use super::{
    Etag, Location, ParentId, ParseTaskStatusError, RequesterContact, TaskId, TaskPatch,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created and has no rider.
    #[default]
    New,
    /// A rider is assigned.
    Active,
    /// The rider collected the items.
    PickedUp,
    /// The items were delivered.
    DroppedOff,
    /// The rider is home and the task is finished.
    Completed,
    /// The task was cancelled.
    Cancelled,
    /// The task was rejected.
    Rejected,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::New,
        Self::Active,
        Self::PickedUp,
        Self::DroppedOff,
        Self::Completed,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::PickedUp => "picked_up",
            Self::DroppedOff => "dropped_off",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether a direct move to `target` is allowed.
    ///
    /// `Active → New` covers removing the last rider.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::Active | Self::Cancelled | Self::Rejected)
                | (Self::Active, Self::New | Self::PickedUp | Self::Cancelled)
                | (Self::PickedUp, Self::DroppedOff)
                | (Self::DroppedOff, Self::Completed)
        )
    }

    /// Returns whether the status is a cancel or reject exit.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "picked_up" => Ok(Self::PickedUp),
            "dropped_off" | "delivered" => Ok(Self::DroppedOff),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

/// A single delivery leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    reference: Option<String>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    time_of_call: Option<DateTime<Utc>>,
    time_picked_up: Option<DateTime<Utc>>,
    time_dropped_off: Option<DateTime<Utc>>,
    time_rejected: Option<DateTime<Utc>>,
    time_cancelled: Option<DateTime<Utc>>,
    time_rider_home: Option<DateTime<Utc>>,
    priority: Option<Priority>,
    requester_contact: RequesterContact,
    pickup_location: Option<Location>,
    dropoff_location: Option<Location>,
    parent_id: Option<ParentId>,
    order_in_relay: u32,
    relay_previous_uuid: Option<TaskId>,
    relay_next: Option<TaskId>,
    rider_responsibility: Option<String>,
    etag: Option<Etag>,
    deleted: bool,
}

/// Parameter object for building a task from remote store data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Display reference code.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Time the delivery was requested.
    pub time_of_call: Option<DateTime<Utc>>,
    /// Picked-up time.
    pub time_picked_up: Option<DateTime<Utc>>,
    /// Dropped-off time.
    pub time_dropped_off: Option<DateTime<Utc>>,
    /// Rejected time.
    pub time_rejected: Option<DateTime<Utc>>,
    /// Cancelled time.
    pub time_cancelled: Option<DateTime<Utc>>,
    /// Rider-home time.
    pub time_rider_home: Option<DateTime<Utc>>,
    /// Delivery priority.
    pub priority: Option<Priority>,
    /// Requester contact details.
    pub requester_contact: RequesterContact,
    /// Pickup address.
    pub pickup_location: Option<Location>,
    /// Dropoff address.
    pub dropoff_location: Option<Location>,
    /// Relay grouping id.
    pub parent_id: Option<ParentId>,
    /// 1-based position within the relay.
    pub order_in_relay: u32,
    /// Previous leg in the relay.
    pub relay_previous_uuid: Option<TaskId>,
    /// Next leg in the relay.
    pub relay_next: Option<TaskId>,
    /// Shared rider responsibility label.
    pub rider_responsibility: Option<String>,
    /// Concurrency token.
    pub etag: Option<Etag>,
    /// Soft-delete flag.
    pub deleted: bool,
}

impl Task {
    /// Reconstructs a task from remote store data.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            reference: data.reference,
            status: data.status,
            created_at: data.created_at,
            time_of_call: data.time_of_call,
            time_picked_up: data.time_picked_up,
            time_dropped_off: data.time_dropped_off,
            time_rejected: data.time_rejected,
            time_cancelled: data.time_cancelled,
            time_rider_home: data.time_rider_home,
            priority: data.priority,
            requester_contact: data.requester_contact,
            pickup_location: data.pickup_location,
            dropoff_location: data.dropoff_location,
            parent_id: data.parent_id,
            order_in_relay: data.order_in_relay,
            relay_previous_uuid: data.relay_previous_uuid,
            relay_next: data.relay_next,
            rider_responsibility: data.rider_responsibility,
            etag: data.etag,
            deleted: data.deleted,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the display reference code.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of call.
    #[must_use]
    pub const fn time_of_call(&self) -> Option<DateTime<Utc>> {
        self.time_of_call
    }

    /// Returns the picked-up time.
    #[must_use]
    pub const fn time_picked_up(&self) -> Option<DateTime<Utc>> {
        self.time_picked_up
    }

    /// Returns the dropped-off time.
    #[must_use]
    pub const fn time_dropped_off(&self) -> Option<DateTime<Utc>> {
        self.time_dropped_off
    }

    /// Returns the rejected time.
    #[must_use]
    pub const fn time_rejected(&self) -> Option<DateTime<Utc>> {
        self.time_rejected
    }

    /// Returns the cancelled time.
    #[must_use]
    pub const fn time_cancelled(&self) -> Option<DateTime<Utc>> {
        self.time_cancelled
    }

    /// Returns the rider-home time.
    #[must_use]
    pub const fn time_rider_home(&self) -> Option<DateTime<Utc>> {
        self.time_rider_home
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Returns the requester contact.
    #[must_use]
    pub const fn requester_contact(&self) -> &RequesterContact {
        &self.requester_contact
    }

    /// Returns the pickup address.
    #[must_use]
    pub const fn pickup_location(&self) -> Option<&Location> {
        self.pickup_location.as_ref()
    }

    /// Returns the dropoff address.
    #[must_use]
    pub const fn dropoff_location(&self) -> Option<&Location> {
        self.dropoff_location.as_ref()
    }

    /// Returns the relay grouping id.
    #[must_use]
    pub const fn parent_id(&self) -> Option<ParentId> {
        self.parent_id
    }

    /// Returns the 1-based position within the relay.
    #[must_use]
    pub const fn order_in_relay(&self) -> u32 {
        self.order_in_relay
    }

    /// Returns the previous leg.
    #[must_use]
    pub const fn relay_previous_uuid(&self) -> Option<TaskId> {
        self.relay_previous_uuid
    }

    /// Returns the next leg.
    #[must_use]
    pub const fn relay_next(&self) -> Option<TaskId> {
        self.relay_next
    }

    /// Returns the rider responsibility label.
    #[must_use]
    pub fn rider_responsibility(&self) -> Option<&str> {
        self.rider_responsibility.as_deref()
    }

    /// Returns the concurrency token.
    #[must_use]
    pub const fn etag(&self) -> Option<&Etag> {
        self.etag.as_ref()
    }

    /// Returns whether the task is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns whether the task was cancelled or rejected.
    ///
    /// Decided by the timestamps, so a cleared `time_cancelled` puts the leg
    /// straight back into its relay.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.time_cancelled.is_some() || self.time_rejected.is_some()
    }

    /// Returns the status implied by the recorded milestone times.
    ///
    /// Cancel and reject win over delivery progress. Without any milestone
    /// the task is `active` while it has a rider and `new` otherwise.
    #[must_use]
    pub const fn status_from_timestamps(&self, has_rider: bool) -> TaskStatus {
        if self.time_rejected.is_some() {
            TaskStatus::Rejected
        } else if self.time_cancelled.is_some() {
            TaskStatus::Cancelled
        } else if self.time_rider_home.is_some() {
            TaskStatus::Completed
        } else if self.time_dropped_off.is_some() {
            TaskStatus::DroppedOff
        } else if self.time_picked_up.is_some() {
            TaskStatus::PickedUp
        } else if has_rider {
            TaskStatus::Active
        } else {
            TaskStatus::New
        }
    }

    /// Returns whether the leg takes part in its relay chain.
    #[must_use]
    pub const fn is_relay_active(&self) -> bool {
        !self.deleted && !self.is_closed()
    }

    /// Applies a partial update.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        assign(&mut self.time_of_call, patch.time_of_call);
        assign(&mut self.time_picked_up, patch.time_picked_up);
        assign(&mut self.time_dropped_off, patch.time_dropped_off);
        assign(&mut self.time_rejected, patch.time_rejected);
        assign(&mut self.time_cancelled, patch.time_cancelled);
        assign(&mut self.time_rider_home, patch.time_rider_home);
        assign(&mut self.priority, patch.priority);
        if let Some(contact) = &patch.requester_contact {
            self.requester_contact = contact.clone();
        }
        assign(&mut self.pickup_location, patch.pickup_location.clone());
        assign(&mut self.dropoff_location, patch.dropoff_location.clone());
        assign(
            &mut self.rider_responsibility,
            patch.rider_responsibility.clone(),
        );
    }

    /// Stores the concurrency token returned by the latest write.
    pub fn set_etag(&mut self, etag: Etag) {
        self.etag = Some(etag);
    }

    /// Joins the task to a relay group.
    pub const fn set_parent_id(&mut self, parent_id: Option<ParentId>) {
        self.parent_id = parent_id;
    }

    /// Marks or unmarks the task as soft-deleted.
    pub const fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Overwrites the relay position and both links.
    pub const fn set_relay_links(
        &mut self,
        order_in_relay: u32,
        previous: Option<TaskId>,
        next: Option<TaskId>,
    ) {
        self.order_in_relay = order_in_relay;
        self.relay_previous_uuid = previous;
        self.relay_next = next;
    }

    /// Sets only the forward link.
    pub const fn set_relay_next(&mut self, next: Option<TaskId>) {
        self.relay_next = next;
    }

    /// Clears both relay links, keeping the parent id and position.
    pub const fn clear_relay_links(&mut self) {
        self.relay_previous_uuid = None;
        self.relay_next = None;
    }
}

fn assign<T>(field: &mut Option<T>, update: Option<Option<T>>) {
    if let Some(value) = update {
        *field = value;
    }
}
