//! Debounced field edits and the generic patch intent.

use super::{
    TaskLifecycleService, UpdateOutcome, error::TaskLifecycleResult,
    transitions::ensure_transition,
};
use crate::task::{
    domain::{
        Location, LocationId, PatchField, Priority, RequesterContact, TaskDomainError, TaskId,
        TaskPatch, TaskStatus,
    },
    ports::{DirectoryStore, Intent, TaskRemoteStore},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::time::Duration;
use tracing::debug;

/// Saved-location slot on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Pickup,
    Dropoff,
}

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    /// Replaces the requester contact details.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_requester_contact(
        &self,
        id: TaskId,
        contact: RequesterContact,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let patch = TaskPatch::new().with_requester_contact(contact);
        self.debounced_update(
            Intent::UpdateRequesterContact,
            id,
            PatchField::RequesterContact,
            self.config.text_field_debounce(),
            patch,
        )
        .await
    }

    /// Sets or clears the pickup address.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_pickup_location(
        &self,
        id: TaskId,
        location: Option<Location>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let patch = TaskPatch::new().with_pickup_location(location);
        self.debounced_update(
            Intent::UpdatePickupLocation,
            id,
            PatchField::PickupLocation,
            self.config.text_field_debounce(),
            patch,
        )
        .await
    }

    /// Sets or clears the dropoff address.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_dropoff_location(
        &self,
        id: TaskId,
        location: Option<Location>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let patch = TaskPatch::new().with_dropoff_location(location);
        self.debounced_update(
            Intent::UpdateDropoffLocation,
            id,
            PatchField::DropoffLocation,
            self.config.text_field_debounce(),
            patch,
        )
        .await
    }

    /// Sets the pickup address from a saved location.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure, including an unknown location.
    pub async fn update_pickup_from_saved(
        &self,
        id: TaskId,
        location_id: LocationId,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.run(
            Intent::UpdatePickupLocation,
            Some(id),
            self.apply_saved_location(Destination::Pickup, id, location_id),
        )
        .await
    }

    /// Sets the dropoff address from a saved location.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure, including an unknown location.
    pub async fn update_dropoff_from_saved(
        &self,
        id: TaskId,
        location_id: LocationId,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.run(
            Intent::UpdateDropoffLocation,
            Some(id),
            self.apply_saved_location(Destination::Dropoff, id, location_id),
        )
        .await
    }

    /// Sets or clears the time of call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_time_of_call(
        &self,
        id: TaskId,
        time_of_call: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let patch = TaskPatch::new().with_time_of_call(time_of_call);
        self.debounced_update(
            Intent::UpdateTimeOfCall,
            id,
            PatchField::TimeOfCall,
            self.config.time_field_debounce(),
            patch,
        )
        .await
    }

    /// Sets or clears the priority.
    ///
    /// Background refreshes wait while a priority update is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_priority(
        &self,
        id: TaskId,
        priority: Option<Priority>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let _in_flight = self.activity.begin_priority_update();
        let patch = TaskPatch::new().with_priority(priority);
        self.debounced_update(
            Intent::UpdatePriority,
            id,
            PatchField::Priority,
            self.config.text_field_debounce(),
            patch,
        )
        .await
    }

    /// Sets or clears the rider responsibility label.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_rider_responsibility(
        &self,
        id: TaskId,
        label: Option<String>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let patch = TaskPatch::new().with_rider_responsibility(label);
        self.debounced_update(
            Intent::UpdateRiderResponsibility,
            id,
            PatchField::RiderResponsibility,
            self.config.time_field_debounce(),
            patch,
        )
        .await
    }

    /// Re-reads the rider responsibility label from the remote store.
    ///
    /// The label of the most recent rider record wins; no records clear the
    /// label.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn refresh_rider_responsibility(
        &self,
        id: TaskId,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let label = self
            .run(
                Intent::UpdateRiderResponsibility,
                Some(id),
                self.latest_rider_label(id),
            )
            .await?;
        self.update_rider_responsibility(id, label).await
    }

    async fn latest_rider_label(&self, id: TaskId) -> TaskLifecycleResult<Option<String>> {
        let records = self.store.get_task_assigned_riders(id).await?;
        Ok(records.into_iter().last().map(|record| record.patch))
    }

    /// Applies an arbitrary patch without debouncing.
    ///
    /// Only `new` and `active` may be set as status here; milestone times
    /// and the statuses they drive belong to the mark intents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyPatch`] when `patch` changes nothing,
    /// [`TaskDomainError::MilestoneInPatch`] when it carries a milestone,
    /// [`TaskDomainError::InvalidStateTransition`] for a disallowed status
    /// change, [`TaskDomainError`] for unknown or deleted tasks, or a remote
    /// failure.
    pub async fn update_task(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.run(
            Intent::UpdateTask,
            Some(id),
            self.apply_generic_update(id, patch),
        )
        .await
    }

    async fn apply_generic_update(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let milestone_status = patch
            .status
            .is_some_and(|status| !matches!(status, TaskStatus::New | TaskStatus::Active));
        if patch.touches_milestone() || milestone_status {
            return Err(TaskDomainError::MilestoneInPatch(id).into());
        }
        if let Some(target) = patch.status {
            ensure_transition(&self.require_live_task(id)?, target)?;
        }
        self.apply_update(id, patch).await
    }

    async fn debounced_update(
        &self,
        intent: Intent,
        id: TaskId,
        field: PatchField,
        window: Duration,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let Some(patch) = self.debouncer.settle((id, field), patch, window).await else {
            debug!(task_id = %id, ?field, "superseded");
            return Ok(UpdateOutcome::Superseded);
        };
        self.run(intent, Some(id), self.apply_update(id, patch))
            .await
    }

    async fn apply_update(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        if patch.is_empty() {
            return Err(TaskDomainError::EmptyPatch(id).into());
        }
        let task = self.require_live_task(id)?;
        let etag = self.push_patch(&task, &patch).await?;
        debug!(task_id = %id, "task updated");
        Ok(UpdateOutcome::Applied {
            etag,
            notification: None,
        })
    }

    async fn apply_saved_location(
        &self,
        destination: Destination,
        id: TaskId,
        location_id: LocationId,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.require_live_task(id)?;
        let location = self.directory.get_location(location_id).await?;
        let (etag, patch) = match destination {
            Destination::Pickup => (
                self.store.set_pickup_destination(id, &location).await?,
                TaskPatch::new().with_pickup_location(Some(location)),
            ),
            Destination::Dropoff => (
                self.store.set_dropoff_destination(id, &location).await?,
                TaskPatch::new().with_dropoff_location(Some(location)),
            ),
        };
        self.merge_update(id, &patch, etag.clone());
        debug!(task_id = %id, location_id = %location_id, ?destination, "saved location applied");
        Ok(UpdateOutcome::Applied {
            etag,
            notification: None,
        })
    }
}
