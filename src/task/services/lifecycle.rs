//! Task lifecycle controller: shared state, publication and the create,
//! delete, restore and undo intents.

use super::{
    activity::ActivityTracker,
    debounce::Debouncer,
    error::{TaskLifecycleError, TaskLifecycleResult},
};
use crate::config::ControllerConfig;
use crate::task::{
    domain::{
        AssigneeRole, Etag, Location, Notification, NotificationId, ParentId, PatchField,
        PersistedTaskData, Priority, RequesterContact, Task, TaskAssignee, TaskCollection,
        TaskDomainError, TaskId, TaskPatch, TaskStatus, UndoAction, UserId,
        relay::{
            dropoff_transfer_on_delete, find_existing_task_parent, group_relays_together,
            reset_group_relay_uuids,
        },
    },
    ports::{
        CreatedTask, DirectoryStore, FailureEvent, Intent, LiveUpdates, NewTaskPayload,
        NotificationSink, SubscriptionHandle, TaskRemoteStore,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    requester_contact: RequesterContact,
    priority: Option<Priority>,
    time_of_call: Option<DateTime<Utc>>,
    pickup_location: Option<Location>,
    dropoff_location: Option<Location>,
}

impl CreateTaskRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets requester contact details.
    #[must_use]
    pub fn with_requester_contact(mut self, contact: RequesterContact) -> Self {
        self.requester_contact = contact;
        self
    }

    /// Sets delivery priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the time the delivery was requested.
    #[must_use]
    pub const fn with_time_of_call(mut self, time_of_call: DateTime<Utc>) -> Self {
        self.time_of_call = Some(time_of_call);
        self
    }

    /// Sets the pickup address.
    #[must_use]
    pub fn with_pickup_location(mut self, location: Location) -> Self {
        self.pickup_location = Some(location);
        self
    }

    /// Sets the dropoff address.
    #[must_use]
    pub fn with_dropoff_location(mut self, location: Location) -> Self {
        self.dropoff_location = Some(location);
        self
    }
}

/// Remote collaborators of the controller.
pub struct LifecyclePorts<S, D> {
    /// Remote task store.
    pub store: Arc<S>,
    /// User and location directory.
    pub directory: Arc<D>,
    /// Live update source for watched tasks.
    pub live_updates: Arc<dyn LiveUpdates>,
    /// Notification surface.
    pub notifier: Arc<dyn NotificationSink>,
}

/// Result of a debounced field or timestamp intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update reached the remote store.
    Applied {
        /// Concurrency token returned by the store.
        etag: Etag,
        /// Undoable notification emitted by the update, if any.
        notification: Option<NotificationId>,
    },
    /// A newer submission for the same field replaced this one.
    Superseded,
}

impl UpdateOutcome {
    /// Returns `true` when the update reached the remote store.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Returns the emitted notification, if any.
    #[must_use]
    pub const fn notification(&self) -> Option<NotificationId> {
        match self {
            Self::Applied { notification, .. } => *notification,
            Self::Superseded => None,
        }
    }
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Task lifecycle controller.
///
/// Owns the local [`TaskCollection`] and publishes every new version through
/// a watch channel. Intent handlers validate against the collection, call
/// the remote store, merge results back and keep relay chains linked.
pub struct TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    pub(super) store: Arc<S>,
    pub(super) directory: Arc<D>,
    pub(super) clock: Arc<C>,
    pub(super) live_updates: Arc<dyn LiveUpdates>,
    pub(super) notifier: Arc<dyn NotificationSink>,
    pub(super) config: ControllerConfig,
    pub(super) tasks: Arc<watch::Sender<TaskCollection>>,
    pub(super) subscriptions: Arc<Mutex<HashMap<TaskId, SubscriptionHandle>>>,
    pub(super) notifications: Arc<Mutex<HashMap<NotificationId, Notification>>>,
    pub(super) debouncer: Arc<Debouncer<(TaskId, PatchField), TaskPatch>>,
    pub(super) activity: Arc<ActivityTracker>,
}

impl<S, D, C> Clone for TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
            live_updates: Arc::clone(&self.live_updates),
            notifier: Arc::clone(&self.notifier),
            config: self.config,
            tasks: Arc::clone(&self.tasks),
            subscriptions: Arc::clone(&self.subscriptions),
            notifications: Arc::clone(&self.notifications),
            debouncer: Arc::clone(&self.debouncer),
            activity: Arc::clone(&self.activity),
        }
    }
}

impl<S, D, C> TaskLifecycleService<S, D, C>
where
    S: TaskRemoteStore,
    D: DirectoryStore,
    C: Clock + Send + Sync,
{
    /// Creates a controller with an empty task collection.
    #[must_use]
    pub fn new(ports: LifecyclePorts<S, D>, clock: Arc<C>, config: ControllerConfig) -> Self {
        let (tasks, _) = watch::channel(TaskCollection::new());
        Self {
            store: ports.store,
            directory: ports.directory,
            clock,
            live_updates: ports.live_updates,
            notifier: ports.notifier,
            config,
            tasks: Arc::new(tasks),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            notifications: Arc::new(Mutex::new(HashMap::new())),
            debouncer: Arc::new(Debouncer::new()),
            activity: Arc::new(ActivityTracker::new()),
        }
    }

    /// Subscribes to published collection versions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskCollection> {
        self.tasks.subscribe()
    }

    /// Returns the current collection version.
    #[must_use]
    pub fn snapshot(&self) -> TaskCollection {
        self.tasks.borrow().clone()
    }

    /// Returns the local copy of a task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.tasks.borrow().get(id).cloned()
    }

    /// Replaces the collection with `tasks`, relinking every relay.
    pub fn load_tasks(&self, tasks: impl IntoIterator<Item = Task>) {
        let grouped = group_relays_together(&TaskCollection::from_tasks(tasks));
        self.tasks.send_modify(|collection| collection.replace_with(grouped));
    }

    /// Returns the notifications that can still be undone or dismissed.
    #[must_use]
    pub fn active_notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).values().cloned().collect()
    }

    /// Returns the in-flight activity tracker.
    #[must_use]
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Returns the timing configuration.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Creates a task and assigns its author as coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Remote`] when creation or the
    /// coordinator assignment fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        self.run(Intent::CreateTask, None, self.create_task_inner(request))
            .await
    }

    async fn create_task_inner(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let payload = NewTaskPayload {
            requester_contact: request.requester_contact,
            priority: request.priority,
            time_of_call: request.time_of_call,
            pickup_location: request.pickup_location,
            dropoff_location: request.dropoff_location,
            parent_id: None,
            relay_previous_uuid: None,
        };
        let created = self.store.create_task(&payload).await?;
        let task = task_from_created(&payload, &created);
        let task_id = task.id();
        self.tasks
            .send_modify(|collection| collection.insert(task.clone()));
        self.watch_task(task_id);

        let coordinator = match created.author_id {
            Some(author) => author,
            None => self.directory.whoami().await?.id,
        };
        self.add_assignment(task_id, coordinator, AssigneeRole::Coordinator)
            .await?;
        info!(task_id = %task_id, reference = ?task.reference(), "task created");
        Ok(task)
    }

    /// Creates the next leg of a relay after `previous_id`.
    ///
    /// The new leg copies requester, priority and time of call from the
    /// previous leg and takes over its dropoff address. The leg is linked
    /// and watched as soon as the store created it; a failed dropoff
    /// hand-over is reported on its own.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the previous leg is
    /// unknown or deleted, and [`TaskLifecycleError::Remote`] when a remote
    /// call fails.
    pub async fn create_relay_leg(&self, previous_id: TaskId) -> TaskLifecycleResult<Task> {
        self.run(
            Intent::CreateRelayLeg,
            Some(previous_id),
            self.create_relay_leg_inner(previous_id),
        )
        .await
    }

    async fn create_relay_leg_inner(&self, previous_id: TaskId) -> TaskLifecycleResult<Task> {
        let previous = self.require_live_task(previous_id)?;
        let payload = NewTaskPayload {
            requester_contact: previous.requester_contact().clone(),
            priority: previous.priority(),
            time_of_call: Some(previous.time_of_call().unwrap_or_else(|| self.clock.utc())),
            pickup_location: None,
            dropoff_location: None,
            parent_id: previous.parent_id(),
            relay_previous_uuid: Some(previous_id),
        };
        let created = self.store.create_task(&payload).await?;
        let parent_id = created.parent_id.or_else(|| previous.parent_id());
        let order = created
            .order_in_relay
            .unwrap_or_else(|| previous.order_in_relay() + 1);
        let mut leg = task_from_created(&payload, &created);
        leg.set_parent_id(parent_id);
        leg.set_relay_links(order, Some(previous_id), None);
        let leg_id = leg.id();

        self.tasks.send_modify(|collection| {
            collection.insert(leg);
            collection.update(previous_id, |task| {
                if task.parent_id().is_none() {
                    task.set_parent_id(parent_id);
                }
                task.set_relay_next(Some(leg_id));
            });
        });
        self.relink_parent(parent_id);
        self.watch_task(leg_id);

        if let Some(dropoff) = previous.dropoff_location().cloned() {
            if let Err(err) = self.hand_over_dropoff(previous_id, leg_id, dropoff).await {
                self.report_failure(Intent::SetDropoffDestination, Some(leg_id), &err);
            }
        }

        let coordinator = self.directory.whoami().await?;
        self.add_assignment(leg_id, coordinator.id, AssigneeRole::Coordinator)
            .await?;
        info!(task_id = %leg_id, previous = %previous_id, order, "relay leg created");
        Ok(self.require_task(leg_id)?)
    }

    async fn hand_over_dropoff(
        &self,
        from: TaskId,
        to: TaskId,
        dropoff: Location,
    ) -> TaskLifecycleResult<()> {
        self.set_dropoff(to, dropoff).await?;
        let etag = self.store.unset_dropoff_destination(from).await?;
        self.merge_update(from, &TaskPatch::new().with_dropoff_location(None), etag);
        Ok(())
    }

    async fn set_dropoff(&self, id: TaskId, location: Location) -> TaskLifecycleResult<()> {
        let etag = self.store.set_dropoff_destination(id, &location).await?;
        self.merge_update(
            id,
            &TaskPatch::new().with_dropoff_location(Some(location)),
            etag,
        );
        Ok(())
    }

    /// Soft-deletes a task.
    ///
    /// A deleted relay tail hands its dropoff address to its predecessor.
    /// The returned notification undoes both. Once the remote delete went
    /// through, a failed hand-over is reported on its own and the delete
    /// still completes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the task is unknown,
    /// already deleted or completed, and [`TaskLifecycleError::Remote`] when
    /// a remote call fails.
    pub async fn delete_task(&self, id: TaskId) -> TaskLifecycleResult<Notification> {
        self.run(Intent::DeleteTask, Some(id), self.delete_task_inner(id))
            .await
    }

    async fn delete_task_inner(&self, id: TaskId) -> TaskLifecycleResult<Notification> {
        let task = self.require_live_task(id)?;
        if task.status() == TaskStatus::Completed {
            return Err(TaskDomainError::TaskCompleted(id).into());
        }
        self.store.delete_task(id).await?;

        let transfer = {
            let snapshot = self.snapshot();
            find_existing_task_parent(&snapshot, id)
                .and_then(|group| dropoff_transfer_on_delete(&group))
        };
        self.tasks.send_modify(|collection| {
            collection.update(id, |stored| stored.set_deleted(true));
        });

        self.relink_parent(task.parent_id());
        self.unwatch_task(id);

        let mut undo = vec![UndoAction::Restore { task_id: id }];
        if let Some(transfer) = transfer {
            let predecessor = transfer.predecessor;
            match self.set_dropoff(predecessor, transfer.location).await {
                Ok(()) => {
                    undo.push(UndoAction::UnsetDropoffDestination {
                        task_id: predecessor,
                    });
                    debug!(task_id = %id, predecessor = %predecessor, "dropoff moved to predecessor");
                }
                Err(err) => {
                    self.report_failure(Intent::SetDropoffDestination, Some(predecessor), &err);
                }
            }
        }

        let notification = Notification::new("Task deleted", undo);
        self.emit(notification.clone());
        info!(task_id = %id, "task deleted");
        Ok(notification)
    }

    /// Restores a soft-deleted task from the remote store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotDeleted`] when the local copy is not
    /// deleted, and [`TaskLifecycleError::Remote`] when a remote call fails.
    pub async fn restore_task(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.run(Intent::RestoreTask, Some(id), self.restore_task_inner(id))
            .await
    }

    pub(super) async fn restore_task_inner(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        if let Some(local) = self.task(id) {
            if !local.is_deleted() {
                return Err(TaskDomainError::TaskNotDeleted(id).into());
            }
        }
        self.store.restore_task(id).await?;
        let restored = self.store.get_task(id).await?;
        let parent_id = restored.parent_id();
        self.tasks
            .send_modify(|collection| collection.insert(restored.clone()));
        self.relink_parent(parent_id);
        self.watch_task(id);
        info!(task_id = %id, "task restored");
        Ok(self.task(id).unwrap_or(restored))
    }

    /// Re-issues the inverse actions of an active notification.
    ///
    /// Undo is a forward mutation: cleared timestamps are sent as `null` and
    /// the local status is re-derived from what remains.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotificationExpired`] when the
    /// notification was already consumed, or the first failing action's
    /// error.
    pub async fn undo(&self, notification_id: NotificationId) -> TaskLifecycleResult<()> {
        self.run(Intent::Undo, None, self.undo_inner(notification_id))
            .await
    }

    async fn undo_inner(&self, notification_id: NotificationId) -> TaskLifecycleResult<()> {
        let notification = lock(&self.notifications)
            .remove(&notification_id)
            .ok_or(TaskLifecycleError::NotificationExpired(notification_id))?;
        self.notifier.dismissed(notification_id);
        for action in notification.undo {
            debug!(notification_id = %notification_id, ?action, "undoing");
            self.apply_undo(action).await?;
        }
        Ok(())
    }

    async fn apply_undo(&self, action: UndoAction) -> TaskLifecycleResult<()> {
        match action {
            UndoAction::ClearPickedUp { task_id } => {
                self.clear_milestone_time(super::transitions::Milestone::PickedUp, task_id)
                    .await
            }
            UndoAction::ClearDroppedOff { task_id } => {
                self.clear_milestone_time(super::transitions::Milestone::DroppedOff, task_id)
                    .await
            }
            UndoAction::ClearCancelled { task_id } => {
                self.clear_milestone_time(super::transitions::Milestone::Cancelled, task_id)
                    .await
            }
            UndoAction::ClearRejected { task_id } => {
                self.clear_milestone_time(super::transitions::Milestone::Rejected, task_id)
                    .await
            }
            UndoAction::Restore { task_id } => self.restore_task_inner(task_id).await.map(drop),
            UndoAction::UnsetDropoffDestination { task_id } => {
                let etag = self.store.unset_dropoff_destination(task_id).await?;
                self.merge_update(task_id, &TaskPatch::new().with_dropoff_location(None), etag);
                Ok(())
            }
        }
    }

    /// Drops a notification without undoing it.
    ///
    /// Returns `false` when the notification was not active.
    pub fn dismiss(&self, notification_id: NotificationId) -> bool {
        let removed = lock(&self.notifications)
            .remove(&notification_id)
            .is_some();
        if removed {
            self.notifier.dismissed(notification_id);
        }
        removed
    }

    pub(super) async fn run<T>(
        &self,
        intent: Intent,
        task_id: Option<TaskId>,
        operation: impl Future<Output = TaskLifecycleResult<T>>,
    ) -> TaskLifecycleResult<T> {
        let result = operation.await;
        if let Err(err) = &result {
            self.report_failure(intent, task_id, err);
        }
        result
    }

    fn report_failure(&self, intent: Intent, task_id: Option<TaskId>, err: &TaskLifecycleError) {
        let kind = err.failure_kind();
        warn!(%intent, ?task_id, ?kind, error = %err, "intent failed");
        self.notifier.failure(&FailureEvent {
            intent,
            kind,
            task_id,
            message: err.to_string(),
        });
    }

    pub(super) fn require_task(&self, id: TaskId) -> Result<Task, TaskDomainError> {
        self.task(id).ok_or(TaskDomainError::UnknownTask(id))
    }

    pub(super) fn require_live_task(&self, id: TaskId) -> Result<Task, TaskDomainError> {
        let task = self.require_task(id)?;
        if task.is_deleted() {
            return Err(TaskDomainError::TaskDeleted(id));
        }
        Ok(task)
    }

    /// Sends `patch` guarded by the task's latest etag and merges the result.
    pub(super) async fn push_patch(
        &self,
        task: &Task,
        patch: &TaskPatch,
    ) -> TaskLifecycleResult<Etag> {
        let etag = self
            .store
            .update_task(task.id(), patch, task.etag().cloned())
            .await?;
        self.merge_update(task.id(), patch, etag.clone());
        Ok(etag)
    }

    pub(super) fn merge_update(&self, id: TaskId, patch: &TaskPatch, etag: Etag) {
        self.tasks.send_modify(|collection| {
            collection.update(id, |task| {
                task.apply_patch(patch);
                task.set_etag(etag);
            });
        });
    }

    pub(super) fn relink_parent(&self, parent_id: Option<ParentId>) {
        if let Some(parent_id) = parent_id {
            self.tasks.send_modify(|collection| {
                let relinked = reset_group_relay_uuids(collection, parent_id);
                collection.replace_with(relinked);
            });
        }
    }

    pub(super) fn relink_all(&self) {
        self.tasks.send_modify(|collection| {
            let relinked = group_relays_together(collection);
            collection.replace_with(relinked);
        });
    }

    pub(super) async fn add_assignment(
        &self,
        task_id: TaskId,
        user_id: UserId,
        role: AssigneeRole,
    ) -> TaskLifecycleResult<TaskAssignee> {
        let assignment = TaskAssignee::new(task_id, user_id, role);
        self.store.add_assignee(&assignment).await?;
        debug!(task_id = %task_id, user_id = %user_id, %role, "assignee added");
        Ok(assignment)
    }

    pub(super) fn watch_task(&self, id: TaskId) {
        let handle = self.live_updates.watch(id);
        lock(&self.subscriptions).insert(id, handle);
    }

    /// Watches exactly `ids`, ending the watches of tasks no longer listed.
    pub(super) fn retain_watches(&self, ids: &HashSet<TaskId>) {
        let stale: Vec<SubscriptionHandle> = {
            let mut subscriptions = lock(&self.subscriptions);
            let gone: Vec<TaskId> = subscriptions
                .keys()
                .filter(|id| !ids.contains(id))
                .copied()
                .collect();
            for id in ids {
                if !subscriptions.contains_key(id) {
                    subscriptions.insert(*id, self.live_updates.watch(*id));
                }
            }
            gone.iter()
                .filter_map(|id| subscriptions.remove(id))
                .collect()
        };
        for handle in stale {
            debug!(task_id = %handle.task_id(), "watch ended");
            handle.cancel();
        }
    }

    pub(super) fn unwatch_task(&self, id: TaskId) {
        let handle = lock(&self.subscriptions).remove(&id);
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    pub(super) fn emit(&self, notification: Notification) -> NotificationId {
        let id = notification.id;
        self.notifier.notify(&notification);
        lock(&self.notifications).insert(id, notification);
        id
    }
}

fn task_from_created(payload: &NewTaskPayload, created: &CreatedTask) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: created.id,
        reference: created.reference.clone(),
        status: TaskStatus::New,
        created_at: created.created_at,
        time_of_call: payload.time_of_call,
        priority: payload.priority,
        requester_contact: payload.requester_contact.clone(),
        pickup_location: payload.pickup_location.clone(),
        dropoff_location: payload.dropoff_location.clone(),
        parent_id: created.parent_id,
        order_in_relay: created.order_in_relay.unwrap_or(1),
        relay_previous_uuid: payload.relay_previous_uuid,
        etag: Some(created.etag.clone()),
        ..PersistedTaskData::default()
    })
}
