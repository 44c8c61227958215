//! Versioned, copy-on-write task collection.

use super::{ParentId, Task, TaskId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// The locally known task set.
///
/// Cloning is cheap; the first write to a shared clone copies the map so
/// earlier versions held by observers never change. Every write bumps
/// [`TaskCollection::version`].
///
/// # Examples
///
/// ```
/// use courier_relay::task::domain::{PersistedTaskData, Task, TaskCollection};
///
/// let before = TaskCollection::new();
/// let task = Task::from_persisted(PersistedTaskData::default());
/// let after = before.with_task(task.clone());
///
/// assert!(before.get(task.id()).is_none());
/// assert_eq!(after.get(task.id()), Some(&task));
/// assert_eq!(after.version(), before.version() + 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    version: u64,
    tasks: Arc<HashMap<TaskId, Task>>,
}

impl TaskCollection {
    /// Creates an empty collection at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from tasks; later duplicates replace earlier ones.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let map = tasks.into_iter().map(|task| (task.id(), task)).collect();
        Self {
            version: 0,
            tasks: Arc::new(map),
        }
    }

    /// Returns the version number of this snapshot.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of tasks, including soft-deleted ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when no task is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks up a task by identifier.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Iterates over every task, including soft-deleted ones.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Iterates over tasks that are not soft-deleted.
    pub fn active(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(|task| !task.is_deleted())
    }

    /// Returns every distinct relay grouping id.
    #[must_use]
    pub fn parent_ids(&self) -> BTreeSet<ParentId> {
        self.tasks.values().filter_map(Task::parent_id).collect()
    }

    /// Inserts or replaces a task in place.
    pub fn insert(&mut self, task: Task) {
        Arc::make_mut(&mut self.tasks).insert(task.id(), task);
        self.version += 1;
    }

    /// Applies `update` to the task with `id` in place.
    ///
    /// Returns `false`, leaving the version untouched, when the task is unknown.
    pub fn update(&mut self, id: TaskId, update: impl FnOnce(&mut Task)) -> bool {
        if !self.tasks.contains_key(&id) {
            return false;
        }
        let Some(task) = Arc::make_mut(&mut self.tasks).get_mut(&id) else {
            return false;
        };
        update(task);
        self.version += 1;
        true
    }

    /// Replaces the whole task set, keeping the version sequence.
    pub fn replace_with(&mut self, other: Self) {
        self.tasks = other.tasks;
        self.version += 1;
    }

    /// Returns a new version with `task` inserted or replaced.
    #[must_use]
    pub fn with_task(&self, task: Task) -> Self {
        let mut next = self.clone();
        next.insert(task);
        next
    }

    /// Returns a new version after applying `update` to several tasks at once.
    #[must_use]
    pub fn with_bulk_update(&self, update: impl FnOnce(&mut HashMap<TaskId, Task>)) -> Self {
        let mut next = self.clone();
        update(Arc::make_mut(&mut next.tasks));
        next.version += 1;
        next
    }
}
