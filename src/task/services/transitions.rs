//! Timestamp-driven status transitions: picked up, dropped off, cancelled,
//! rejected and rider home.

use super::{TaskLifecycleService, UpdateOutcome, error::TaskLifecycleResult};
use crate::task::{
    domain::{
        AssigneeRole, Notification, PatchField, Task, TaskDomainError, TaskId, TaskPatch,
        TaskStatus, UndoAction,
    },
    ports::{DirectoryStore, Intent, TaskRemoteStore},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info};

/// Timestamped milestone of a delivery leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Milestone {
    PickedUp,
    DroppedOff,
    Cancelled,
    Rejected,
}

impl Milestone {
    const fn field(self) -> PatchField {
        match self {
            Self::PickedUp => PatchField::TimePickedUp,
            Self::DroppedOff => PatchField::TimeDroppedOff,
            Self::Cancelled => PatchField::TimeCancelled,
            Self::Rejected => PatchField::TimeRejected,
        }
    }

    const fn status(self) -> TaskStatus {
        match self {
            Self::PickedUp => TaskStatus::PickedUp,
            Self::DroppedOff => TaskStatus::DroppedOff,
            Self::Cancelled => TaskStatus::Cancelled,
            Self::Rejected => TaskStatus::Rejected,
        }
    }

    const fn intent(self) -> Intent {
        match self {
            Self::PickedUp => Intent::MarkPickedUp,
            Self::DroppedOff => Intent::MarkDroppedOff,
            Self::Cancelled => Intent::MarkCancelled,
            Self::Rejected => Intent::MarkRejected,
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::PickedUp => "Task marked picked up",
            Self::DroppedOff => "Task marked delivered",
            Self::Cancelled => "Task marked cancelled",
            Self::Rejected => "Task marked rejected",
        }
    }

    const fn undo(self, task_id: TaskId) -> UndoAction {
        match self {
            Self::PickedUp => UndoAction::ClearPickedUp { task_id },
            Self::DroppedOff => UndoAction::ClearDroppedOff { task_id },
            Self::Cancelled => UndoAction::ClearCancelled { task_id },
            Self::Rejected => UndoAction::ClearRejected { task_id },
        }
    }

    const fn current(self, task: &Task) -> Option<DateTime<Utc>> {
        match self {
            Self::PickedUp => task.time_picked_up(),
            Self::DroppedOff => task.time_dropped_off(),
            Self::Cancelled => task.time_cancelled(),
            Self::Rejected => task.time_rejected(),
        }
    }

    /// Setting a time also moves the status; clearing touches the time only.
    fn patch(self, value: Option<DateTime<Utc>>) -> TaskPatch {
        let patch = match self {
            Self::PickedUp => TaskPatch::new().with_time_picked_up(value),
            Self::DroppedOff => TaskPatch::new().with_time_dropped_off(value),
            Self::Cancelled => TaskPatch::new().with_time_cancelled(value),
            Self::Rejected => TaskPatch::new().with_time_rejected(value),
        };
        if value.is_some() {
            patch.with_status(self.status())
        } else {
            patch
        }
    }
}

pub(super) fn ensure_transition(task: &Task, target: TaskStatus) -> Result<(), TaskDomainError> {
    let from = task.status();
    if from == target || from.can_transition_to(target) {
        Ok(())
    } else {
        Err(TaskDomainError::InvalidStateTransition { from, to: target })
    }
}

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    /// Sets or clears the picked-up time.
    ///
    /// Setting a time moves the task to `picked_up` and, the first time,
    /// emits an undoable notification. `None` clears the time and the status
    /// falls back to whatever the remaining times and riders imply.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the status
    /// cannot move to `picked_up`, or a remote failure.
    pub async fn mark_picked_up(
        &self,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.mark(Milestone::PickedUp, id, at).await
    }

    /// Sets or clears the dropped-off time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the status
    /// cannot move to `dropped_off`, or a remote failure.
    pub async fn mark_dropped_off(
        &self,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.mark(Milestone::DroppedOff, id, at).await
    }

    /// Sets or clears the cancelled time and relinks the task's relay.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the status
    /// cannot move to `cancelled`, or a remote failure.
    pub async fn mark_cancelled(
        &self,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.mark(Milestone::Cancelled, id, at).await
    }

    /// Sets or clears the rejected time and relinks every relay.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the status
    /// cannot move to `rejected`, or a remote failure.
    pub async fn mark_rejected(
        &self,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.mark(Milestone::Rejected, id, at).await
    }

    /// Records the rider's return and completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is dropped off or already completed, or a remote failure.
    pub async fn mark_rider_home(&self, id: TaskId) -> TaskLifecycleResult<UpdateOutcome> {
        self.run(Intent::MarkRiderHome, Some(id), self.mark_rider_home_inner(id))
            .await
    }

    async fn mark_rider_home_inner(&self, id: TaskId) -> TaskLifecycleResult<UpdateOutcome> {
        let task = self.require_live_task(id)?;
        ensure_transition(&task, TaskStatus::Completed)?;
        let patch = TaskPatch::new()
            .with_time_rider_home(Some(self.clock.utc()))
            .with_status(TaskStatus::Completed);
        let etag = self.push_patch(&task, &patch).await?;
        info!(task_id = %id, "rider home");
        Ok(UpdateOutcome::Applied {
            etag,
            notification: None,
        })
    }

    async fn mark(
        &self,
        milestone: Milestone,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        self.run(milestone.intent(), Some(id), self.apply_milestone(milestone, id, at))
            .await
    }

    pub(super) async fn clear_milestone_time(
        &self,
        milestone: Milestone,
        id: TaskId,
    ) -> TaskLifecycleResult<()> {
        self.apply_milestone(milestone, id, None).await.map(drop)
    }

    async fn apply_milestone(
        &self,
        milestone: Milestone,
        id: TaskId,
        at: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<UpdateOutcome> {
        let window = self.config.time_field_debounce();
        let Some(patch) = self
            .debouncer
            .settle((id, milestone.field()), milestone.patch(at), window)
            .await
        else {
            debug!(task_id = %id, ?milestone, "superseded");
            return Ok(UpdateOutcome::Superseded);
        };

        let task = self.require_live_task(id)?;
        if at.is_some() {
            ensure_transition(&task, milestone.status())?;
        }
        let first = milestone.current(&task).is_none();
        let etag = self.push_patch(&task, &patch).await?;
        if at.is_none() {
            self.settle_status_after_clear(id).await?;
        }

        match milestone {
            Milestone::Cancelled => self.relink_parent(task.parent_id()),
            Milestone::Rejected => {
                self.relink_all();
                self.relink_parent(task.parent_id());
            }
            Milestone::PickedUp | Milestone::DroppedOff => {}
        }

        let notification = (at.is_some() && first).then(|| {
            self.emit(
                Notification::new(milestone.message(), vec![milestone.undo(id)])
                    .with_task_link(id),
            )
        });
        info!(task_id = %id, ?milestone, cleared = at.is_none(), "milestone updated");
        Ok(UpdateOutcome::Applied { etag, notification })
    }

    /// Re-derives the local status after a milestone time was cleared.
    ///
    /// Only the cleared time travels on the wire; the store derives its own
    /// status the same way.
    pub(super) async fn settle_status_after_clear(
        &self,
        id: TaskId,
    ) -> TaskLifecycleResult<TaskStatus> {
        let assignees = self.store.list_assignees(id).await?;
        let has_rider = assignees
            .iter()
            .any(|assignment| assignment.role == AssigneeRole::Rider);
        let task = self.require_task(id)?;
        let status = task.status_from_timestamps(has_rider);
        if status != task.status() {
            let patch = TaskPatch::new().with_status(status);
            self.tasks.send_modify(|collection| {
                collection.update(id, |stored| stored.apply_patch(&patch));
            });
            debug!(task_id = %id, from = %task.status(), to = %status, "status re-derived");
        }
        Ok(status)
    }
}
