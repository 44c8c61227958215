//! Partial task updates sent to the remote store.

use super::{Location, Priority, RequesterContact, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Partial update for a task.
///
/// Nullable fields use `Option<Option<T>>`: the outer `None` leaves the field
/// alone and `Some(None)` clears it. Absent fields are omitted from the wire
/// form and cleared fields serialise as `null`.
///
/// # Examples
///
/// ```
/// use courier_relay::task::domain::TaskPatch;
///
/// let patch = TaskPatch::new().with_time_cancelled(None);
/// assert_eq!(
///     serde_json::to_value(&patch).ok(),
///     Some(serde_json::json!({ "time_cancelled": null })),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    /// New lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Time the delivery was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_call: Option<Option<DateTime<Utc>>>,
    /// Time the rider collected the items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_picked_up: Option<Option<DateTime<Utc>>>,
    /// Time the items were delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_dropped_off: Option<Option<DateTime<Utc>>>,
    /// Time the task was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_rejected: Option<Option<DateTime<Utc>>>,
    /// Time the task was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_cancelled: Option<Option<DateTime<Utc>>>,
    /// Time the rider reported back home.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_rider_home: Option<Option<DateTime<Utc>>>,
    /// Delivery priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<Priority>>,
    /// Requester contact details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_contact: Option<RequesterContact>,
    /// Pickup address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Option<Location>>,
    /// Dropoff address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<Option<Location>>,
    /// Shared rider responsibility label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_responsibility: Option<Option<String>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets or clears the time of call.
    #[must_use]
    pub fn with_time_of_call(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_of_call = Some(value);
        self
    }

    /// Sets or clears the picked-up time.
    #[must_use]
    pub fn with_time_picked_up(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_picked_up = Some(value);
        self
    }

    /// Sets or clears the dropped-off time.
    #[must_use]
    pub fn with_time_dropped_off(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_dropped_off = Some(value);
        self
    }

    /// Sets or clears the rejected time.
    #[must_use]
    pub fn with_time_rejected(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_rejected = Some(value);
        self
    }

    /// Sets or clears the cancelled time.
    #[must_use]
    pub fn with_time_cancelled(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_cancelled = Some(value);
        self
    }

    /// Sets or clears the rider-home time.
    #[must_use]
    pub fn with_time_rider_home(mut self, value: Option<DateTime<Utc>>) -> Self {
        self.time_rider_home = Some(value);
        self
    }

    /// Sets or clears the priority.
    #[must_use]
    pub fn with_priority(mut self, value: Option<Priority>) -> Self {
        self.priority = Some(value);
        self
    }

    /// Replaces the requester contact.
    #[must_use]
    pub fn with_requester_contact(mut self, contact: RequesterContact) -> Self {
        self.requester_contact = Some(contact);
        self
    }

    /// Sets or clears the pickup location.
    #[must_use]
    pub fn with_pickup_location(mut self, location: Option<Location>) -> Self {
        self.pickup_location = Some(location);
        self
    }

    /// Sets or clears the dropoff location.
    #[must_use]
    pub fn with_dropoff_location(mut self, location: Option<Location>) -> Self {
        self.dropoff_location = Some(location);
        self
    }

    /// Sets or clears the rider responsibility label.
    #[must_use]
    pub fn with_rider_responsibility(mut self, label: Option<String>) -> Self {
        self.rider_responsibility = Some(label);
        self
    }

    /// Returns `true` when the patch changes no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` when the patch clears any milestone time.
    #[must_use]
    pub const fn clears_milestone(&self) -> bool {
        matches!(self.time_picked_up, Some(None))
            || matches!(self.time_dropped_off, Some(None))
            || matches!(self.time_cancelled, Some(None))
            || matches!(self.time_rejected, Some(None))
            || matches!(self.time_rider_home, Some(None))
    }

    /// Returns `true` when the patch sets or clears any milestone time.
    #[must_use]
    pub const fn touches_milestone(&self) -> bool {
        self.time_picked_up.is_some()
            || self.time_dropped_off.is_some()
            || self.time_cancelled.is_some()
            || self.time_rejected.is_some()
            || self.time_rider_home.is_some()
    }
}

/// Field families that are debounced independently per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchField {
    /// Requester contact details.
    RequesterContact,
    /// Pickup address.
    PickupLocation,
    /// Dropoff address.
    DropoffLocation,
    /// Time of call.
    TimeOfCall,
    /// Picked-up time.
    TimePickedUp,
    /// Dropped-off time.
    TimeDroppedOff,
    /// Cancelled time.
    TimeCancelled,
    /// Rejected time.
    TimeRejected,
    /// Priority.
    Priority,
    /// Rider responsibility label.
    RiderResponsibility,
}
