//! In-memory remote task store for controller tests.

use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        AssigneeRole, AssignmentId, Etag, Location, ParentId, PersistedTaskData, Task,
        TaskAssignee, TaskId, TaskPatch, TaskStatus, UserId,
    },
    ports::{
        CreatedTask, NewTaskPayload, PatchRecord, RemoteStoreError, RemoteStoreResult,
        SortDirection, TaskQuery, TaskRemoteStore,
    },
};

/// Thread-safe in-memory task store.
///
/// Relay parents and positions are allocated the way the hosted store does:
/// a leg created after a task without a parent puts both into a fresh
/// relay, and every new leg is appended after the highest live position.
pub struct InMemoryTaskStore<C: Clock + Send + Sync> {
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: C,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    assignees: Vec<TaskAssignee>,
    rider_records: HashMap<TaskId, Vec<PatchRecord>>,
    sent_patches: HashMap<TaskId, Vec<TaskPatch>>,
    author: Option<UserId>,
    next_parent: u64,
    next_reference: u64,
    next_etag: u64,
}

impl InMemoryTaskState {
    fn fresh_etag(&mut self) -> Etag {
        self.next_etag += 1;
        Etag::new(format!("W/\"{}\"", self.next_etag))
    }

    fn fresh_parent(&mut self) -> RemoteStoreResult<ParentId> {
        self.next_parent += 1;
        ParentId::from_raw(self.next_parent)
            .ok_or_else(|| RemoteStoreError::Validation("parent id space exhausted".to_owned()))
    }

    fn live_task_mut(&mut self, id: TaskId) -> RemoteStoreResult<&mut Task> {
        self.tasks
            .get_mut(&id)
            .filter(|task| !task.is_deleted())
            .ok_or_else(|| RemoteStoreError::NotFound(format!("task {id}")))
    }

    /// Applies `patch`; clearing a milestone time re-derives the status the
    /// way the hosted store does.
    fn touch(&mut self, id: TaskId, patch: &TaskPatch) -> RemoteStoreResult<Etag> {
        let etag = self.fresh_etag();
        let has_rider = self.has_rider(id);
        let task = self.live_task_mut(id)?;
        task.apply_patch(patch);
        if patch.clears_milestone() {
            let status = task.status_from_timestamps(has_rider);
            task.apply_patch(&TaskPatch::new().with_status(status));
        }
        task.set_etag(etag.clone());
        Ok(etag)
    }

    fn has_rider(&self, id: TaskId) -> bool {
        self.assignees
            .iter()
            .any(|assignment| assignment.task_id == id && assignment.role == AssigneeRole::Rider)
    }

    fn next_order(&self, parent_id: ParentId) -> u32 {
        self.tasks
            .values()
            .filter(|task| task.parent_id() == Some(parent_id) && !task.is_deleted())
            .map(Task::order_in_relay)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl<C: Clock + Send + Sync> InMemoryTaskStore<C> {
    /// Creates an empty store stamping creations with `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }

    /// Records `author` as the author of every created task.
    #[must_use]
    pub fn with_author(self, author: UserId) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.author = Some(author);
        }
        self
    }

    /// Inserts a task as if another client had created it.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the store lock is
    /// poisoned.
    pub fn seed(&self, task: Task) -> RemoteStoreResult<()> {
        let mut state = self.write()?;
        state.tasks.insert(task.id(), task);
        Ok(())
    }

    /// Appends a rider responsibility record for a task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the store lock is
    /// poisoned.
    pub fn push_rider_record(&self, task_id: TaskId, record: PatchRecord) -> RemoteStoreResult<()> {
        let mut state = self.write()?;
        state.rider_records.entry(task_id).or_default().push(record);
        Ok(())
    }

    /// Returns the stored copy of a task, including deleted ones.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the store lock is
    /// poisoned.
    pub fn stored(&self, id: TaskId) -> RemoteStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    /// Returns the patches accepted through `update_task` for a task, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the store lock is
    /// poisoned.
    pub fn sent_patches(&self, id: TaskId) -> RemoteStoreResult<Vec<TaskPatch>> {
        Ok(self
            .read()?
            .sent_patches
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn read(&self) -> RemoteStoreResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| RemoteStoreError::transport(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RemoteStoreResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| RemoteStoreError::transport(std::io::Error::other(err.to_string())))
    }
}

fn is_assigned(state: &InMemoryTaskState, task_id: TaskId, query: &TaskQuery) -> bool {
    state.assignees.iter().any(|assignment| {
        assignment.task_id == task_id
            && assignment.assignee_id == query.user_id
            && assignment.role == query.role
    })
}

const fn is_archival(status: TaskStatus) -> bool {
    matches!(
        status,
        TaskStatus::DroppedOff
            | TaskStatus::Completed
            | TaskStatus::Cancelled
            | TaskStatus::Rejected
    )
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskRemoteStore for InMemoryTaskStore<C> {
    async fn create_task(&self, payload: &NewTaskPayload) -> RemoteStoreResult<CreatedTask> {
        let created_at = self.clock.utc();
        let mut state = self.write()?;

        let (parent_id, order_in_relay) = match payload.relay_previous_uuid {
            Some(previous_id) => {
                let previous_parent = state
                    .tasks
                    .get(&previous_id)
                    .ok_or_else(|| RemoteStoreError::NotFound(format!("task {previous_id}")))?
                    .parent_id();
                let parent_id = match payload.parent_id.or(previous_parent) {
                    Some(parent_id) => parent_id,
                    None => state.fresh_parent()?,
                };
                if let Some(previous) = state.tasks.get_mut(&previous_id) {
                    if previous.parent_id().is_none() {
                        previous.set_parent_id(Some(parent_id));
                    }
                }
                let order = state.next_order(parent_id);
                (Some(parent_id), order)
            }
            None => (payload.parent_id, 1),
        };

        state.next_reference += 1;
        let reference = format!("REF-{:04}", state.next_reference);
        let etag = state.fresh_etag();
        let id = TaskId::new();
        let task = Task::from_persisted(PersistedTaskData {
            id,
            reference: Some(reference.clone()),
            created_at,
            time_of_call: payload.time_of_call,
            priority: payload.priority,
            requester_contact: payload.requester_contact.clone(),
            pickup_location: payload.pickup_location.clone(),
            dropoff_location: payload.dropoff_location.clone(),
            parent_id,
            order_in_relay,
            relay_previous_uuid: payload.relay_previous_uuid,
            etag: Some(etag.clone()),
            ..PersistedTaskData::default()
        });
        state.tasks.insert(id, task);

        Ok(CreatedTask {
            id,
            reference: Some(reference),
            parent_id,
            order_in_relay: Some(order_in_relay),
            author_id: state.author,
            created_at,
            etag,
        })
    }

    async fn update_task(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        etag: Option<Etag>,
    ) -> RemoteStoreResult<Etag> {
        let mut state = self.write()?;
        let current = state.live_task_mut(id)?.etag().cloned();
        if let (Some(sent), Some(current)) = (etag, current) {
            if sent != current {
                return Err(RemoteStoreError::StaleWrite(format!(
                    "task {id} is at {current}, write carried {sent}"
                )));
            }
        }
        let etag = state.touch(id, patch)?;
        state
            .sent_patches
            .entry(id)
            .or_default()
            .push(patch.clone());
        Ok(etag)
    }

    async fn get_task(&self, id: TaskId) -> RemoteStoreResult<Task> {
        self.read()?
            .tasks
            .get(&id)
            .filter(|task| !task.is_deleted())
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(format!("task {id}")))
    }

    async fn get_tasks(&self, query: &TaskQuery) -> RemoteStoreResult<Vec<Task>> {
        let state = self.read()?;
        if query.archived && !is_archival(query.status) {
            return Ok(Vec::new());
        }
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| !task.is_deleted() && task.status() == query.status)
            .filter(|task| is_assigned(&state, task.id(), query))
            .cloned()
            .collect();
        tasks.sort_by_key(Task::created_at);
        if query.sort == SortDirection::Descending {
            tasks.reverse();
        }
        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId) -> RemoteStoreResult<()> {
        let mut state = self.write()?;
        state.live_task_mut(id)?.set_deleted(true);
        Ok(())
    }

    async fn restore_task(&self, id: TaskId) -> RemoteStoreResult<()> {
        let mut state = self.write()?;
        let etag = state.fresh_etag();
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| RemoteStoreError::NotFound(format!("task {id}")))?;
        task.set_deleted(false);
        task.set_etag(etag);
        Ok(())
    }

    async fn get_task_assigned_riders(&self, id: TaskId) -> RemoteStoreResult<Vec<PatchRecord>> {
        let state = self.read()?;
        if !state.tasks.contains_key(&id) {
            return Err(RemoteStoreError::NotFound(format!("task {id}")));
        }
        Ok(state.rider_records.get(&id).cloned().unwrap_or_default())
    }

    async fn set_pickup_destination(
        &self,
        id: TaskId,
        location: &Location,
    ) -> RemoteStoreResult<Etag> {
        let patch = TaskPatch::new().with_pickup_location(Some(location.clone()));
        self.write()?.touch(id, &patch)
    }

    async fn set_dropoff_destination(
        &self,
        id: TaskId,
        location: &Location,
    ) -> RemoteStoreResult<Etag> {
        let patch = TaskPatch::new().with_dropoff_location(Some(location.clone()));
        self.write()?.touch(id, &patch)
    }

    async fn unset_dropoff_destination(&self, id: TaskId) -> RemoteStoreResult<Etag> {
        let patch = TaskPatch::new().with_dropoff_location(None);
        self.write()?.touch(id, &patch)
    }

    async fn add_assignee(&self, assignment: &TaskAssignee) -> RemoteStoreResult<()> {
        let mut state = self.write()?;
        state.live_task_mut(assignment.task_id)?;
        state.assignees.push(assignment.clone());
        Ok(())
    }

    async fn remove_assignee(&self, id: AssignmentId) -> RemoteStoreResult<TaskAssignee> {
        let mut state = self.write()?;
        let position = state
            .assignees
            .iter()
            .position(|assignment| assignment.id == id)
            .ok_or_else(|| RemoteStoreError::NotFound(format!("assignment {id}")))?;
        Ok(state.assignees.remove(position))
    }

    async fn list_assignees(&self, task_id: TaskId) -> RemoteStoreResult<Vec<TaskAssignee>> {
        Ok(self
            .read()?
            .assignees
            .iter()
            .filter(|assignment| assignment.task_id == task_id)
            .cloned()
            .collect())
    }
}
