//! Task listing, single-task refresh and the background refresh loop.

use super::{TaskLifecycleService, error::TaskLifecycleResult};
use crate::task::{
    domain::{AssigneeRole, Task, TaskCollection, TaskId, TaskStatus, UserId, relay},
    ports::{DirectoryStore, Intent, SortDirection, TaskQuery, TaskRemoteStore},
};
use mockable::Clock;
use std::collections::HashSet;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Statuses listed by a full fetch, with their archive flag and sort order.
const LISTINGS: [(TaskStatus, bool, SortDirection); 6] = [
    (TaskStatus::New, false, SortDirection::Descending),
    (TaskStatus::Active, false, SortDirection::Ascending),
    (TaskStatus::PickedUp, false, SortDirection::Ascending),
    (TaskStatus::DroppedOff, true, SortDirection::Descending),
    (TaskStatus::Cancelled, true, SortDirection::Descending),
    (TaskStatus::Rejected, true, SortDirection::Descending),
];

/// Handle for a running background refresh loop.
///
/// Dropping the handle stops the loop after its current step.
#[derive(Debug)]
pub struct RefreshLoopHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl RefreshLoopHandle {
    /// Stops the loop and waits for it to finish.
    ///
    /// A refresh already in flight completes first.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        if let Err(err) = self.join.await {
            warn!(error = %err, "refresh loop ended abnormally");
        }
    }

    /// Returns `true` once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    /// Lists every task `user_id` holds in `role` and replaces the local
    /// collection with the relinked result.
    ///
    /// Live updates follow the listing: tasks that dropped out stop being
    /// watched.
    ///
    /// The six per-status listings run concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first listing failure; the collection is left untouched.
    pub async fn fetch_tasks(
        &self,
        user_id: UserId,
        role: AssigneeRole,
    ) -> TaskLifecycleResult<TaskCollection> {
        self.run(Intent::FetchTasks, None, self.fetch_tasks_inner(user_id, role))
            .await
    }

    async fn fetch_tasks_inner(
        &self,
        user_id: UserId,
        role: AssigneeRole,
    ) -> TaskLifecycleResult<TaskCollection> {
        let _in_flight = self.activity.begin_fetch();
        let [new, active, picked_up, dropped_off, cancelled, rejected] =
            LISTINGS.map(|(status, archived, sort)| TaskQuery {
                user_id,
                archived,
                role,
                status,
                cursor: None,
                sort,
            });
        let (
            new_tasks,
            active_tasks,
            picked_up_tasks,
            dropped_off_tasks,
            cancelled_tasks,
            rejected_tasks,
        ) = tokio::try_join!(
            self.store.get_tasks(&new),
            self.store.get_tasks(&active),
            self.store.get_tasks(&picked_up),
            self.store.get_tasks(&dropped_off),
            self.store.get_tasks(&cancelled),
            self.store.get_tasks(&rejected),
        )?;
        let merged = relay::convert_task_lists_to_objects([
            new_tasks,
            active_tasks,
            picked_up_tasks,
            dropped_off_tasks,
            cancelled_tasks,
            rejected_tasks,
        ]);
        let grouped = relay::group_relays_together(&merged);
        self.tasks
            .send_modify(|collection| collection.replace_with(grouped));

        let snapshot = self.snapshot();
        let listed: HashSet<TaskId> = snapshot.active().map(Task::id).collect();
        self.retain_watches(&listed);
        debug!(user_id = %user_id, %role, count = snapshot.len(), "tasks fetched");
        Ok(snapshot)
    }

    /// Lists the tasks assigned to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a remote failure.
    pub async fn fetch_my_tasks(&self) -> TaskLifecycleResult<Vec<Task>> {
        self.run(Intent::FetchMyTasks, None, self.fetch_my_tasks_inner())
            .await
    }

    async fn fetch_my_tasks_inner(&self) -> TaskLifecycleResult<Vec<Task>> {
        let me = self.directory.whoami().await?;
        Ok(self.directory.get_assigned_tasks(me.id).await?)
    }

    /// Refetches one task and merges it into the collection.
    ///
    /// # Errors
    ///
    /// Returns a remote failure, including
    /// [`crate::task::ports::RemoteStoreError::NotFound`].
    pub async fn fetch_task(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.run(Intent::FetchTask, Some(id), self.fetch_task_inner(id))
            .await
    }

    async fn fetch_task_inner(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        let _in_flight = self.activity.begin_fetch();
        let task = self.store.get_task(id).await?;
        let parent_id = task.parent_id();
        self.tasks
            .send_modify(|collection| collection.insert(task.clone()));
        self.relink_parent(parent_id);
        Ok(self.task(id).unwrap_or(task))
    }
}

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore + 'static,
    D: DirectoryStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Spawns the background refresh loop.
    ///
    /// While a fetch or priority update is in flight, or the user is idle,
    /// the loop waits the backoff delay and checks again; otherwise it
    /// refreshes and waits the full interval. Failures are reported and the
    /// loop carries on.
    #[must_use = "dropping the handle stops the loop"]
    pub fn spawn_refresh_loop(&self, user_id: UserId, role: AssigneeRole) -> RefreshLoopHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let service = self.clone();
        let join = tokio::spawn(async move {
            info!(user_id = %user_id, %role, "refresh loop started");
            loop {
                let delay = if service.activity.should_defer_refresh() {
                    debug!("refresh deferred");
                    service.config.refresh_backoff()
                } else {
                    if let Err(err) = service.fetch_tasks(user_id, role).await {
                        debug!(error = %err, "refresh failed");
                    }
                    service.config.refresh_interval()
                };
                tokio::select! {
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
            info!(user_id = %user_id, "refresh loop stopped");
        });
        RefreshLoopHandle { shutdown, join }
    }
}
