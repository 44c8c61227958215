//! Rider and coordinator assignment intents.

use super::{TaskLifecycleService, error::TaskLifecycleResult};
use crate::task::{
    domain::{
        AssigneeRole, AssignmentId, TaskAssignee, TaskDomainError, TaskId, TaskPatch, TaskStatus,
        UserId,
    },
    ports::{DirectoryStore, Intent, TaskRemoteStore},
};
use mockable::Clock;
use tracing::info;

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    /// Assigns a rider.
    ///
    /// The first rider moves a `new` task to `active`, and the rider's
    /// responsibility label becomes the task's label.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`] for cancelled or rejected
    /// tasks, [`TaskDomainError::TaskDeleted`] for deleted ones, or a remote
    /// failure.
    pub async fn assign_rider(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<TaskAssignee> {
        self.run(
            Intent::AssignRider,
            Some(task_id),
            self.assign_rider_inner(task_id, user_id),
        )
        .await
    }

    async fn assign_rider_inner(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<TaskAssignee> {
        let task = self.require_live_task(task_id)?;
        if task.status().is_closed() || task.is_closed() {
            return Err(TaskDomainError::TaskClosed {
                task_id,
                status: task.status(),
            }
            .into());
        }
        let rider = self.directory.get_user(user_id).await?;
        let assignment = self
            .add_assignment(task_id, user_id, AssigneeRole::Rider)
            .await?;

        let mut patch = TaskPatch::new();
        if task.status() == TaskStatus::New {
            patch = patch.with_status(TaskStatus::Active);
        }
        if let Some(label) = rider.rider_responsibility {
            patch = patch.with_rider_responsibility(Some(label));
        }
        if !patch.is_empty() {
            self.push_patch(&task, &patch).await?;
        }
        info!(task_id = %task_id, user_id = %user_id, "rider assigned");
        Ok(assignment)
    }

    /// Assigns a coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskDeleted`] for deleted tasks or a
    /// remote failure.
    pub async fn assign_coordinator(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<TaskAssignee> {
        self.run(
            Intent::AssignCoordinator,
            Some(task_id),
            self.assign_coordinator_inner(task_id, user_id),
        )
        .await
    }

    async fn assign_coordinator_inner(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<TaskAssignee> {
        self.require_live_task(task_id)?;
        self.add_assignment(task_id, user_id, AssigneeRole::Coordinator)
            .await
    }

    /// Removes an assignment.
    ///
    /// When the last rider leaves an `active` task it returns to `new` and
    /// loses its label; otherwise the label follows the most recently
    /// assigned remaining rider.
    ///
    /// # Errors
    ///
    /// Returns a remote failure, including
    /// [`crate::task::ports::RemoteStoreError::NotFound`] for unknown
    /// assignments.
    pub async fn unassign(&self, assignment_id: AssignmentId) -> TaskLifecycleResult<TaskAssignee> {
        self.run(Intent::Unassign, None, self.unassign_inner(assignment_id))
            .await
    }

    async fn unassign_inner(
        &self,
        assignment_id: AssignmentId,
    ) -> TaskLifecycleResult<TaskAssignee> {
        let removed = self.store.remove_assignee(assignment_id).await?;
        if removed.role == AssigneeRole::Rider {
            self.settle_riders_after_removal(removed.task_id).await?;
        }
        info!(
            task_id = %removed.task_id,
            user_id = %removed.assignee_id,
            role = %removed.role,
            "assignee removed"
        );
        Ok(removed)
    }

    /// Lists the assignments of a task.
    ///
    /// # Errors
    ///
    /// Returns a remote failure.
    pub async fn assignees(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskAssignee>> {
        Ok(self.store.list_assignees(task_id).await?)
    }

    async fn settle_riders_after_removal(&self, task_id: TaskId) -> TaskLifecycleResult<()> {
        let Some(task) = self.task(task_id).filter(|task| !task.is_deleted()) else {
            return Ok(());
        };
        let remaining = self.store.list_assignees(task_id).await?;
        let last_rider = remaining
            .iter()
            .rev()
            .find(|assignment| assignment.role == AssigneeRole::Rider);

        let patch = match last_rider {
            None => {
                let patch = TaskPatch::new().with_rider_responsibility(None);
                if task.status() == TaskStatus::Active {
                    patch.with_status(TaskStatus::New)
                } else {
                    patch
                }
            }
            Some(rider) => {
                let user = self.directory.get_user(rider.assignee_id).await?;
                TaskPatch::new().with_rider_responsibility(user.rider_responsibility)
            }
        };
        self.push_patch(&task, &patch).await?;
        Ok(())
    }
}
