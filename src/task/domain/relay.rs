//! Relay grouping: partitioning tasks into relays and relinking their legs.
//!
//! Every function here is pure. Functions that change links take a
//! [`TaskCollection`] snapshot and return the next version.

use super::{Location, ParentId, Task, TaskCollection, TaskId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A task together with the legs that share its parent id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup<'a> {
    /// The task that was looked up.
    pub task: &'a Task,
    /// Every non-deleted leg of the relay plus `task`, in group order.
    pub members: Vec<&'a Task>,
}

impl TaskGroup<'_> {
    /// Returns `true` when `task` is the last member in group order.
    #[must_use]
    pub fn is_tail(&self) -> bool {
        self.members
            .last()
            .is_some_and(|last| last.id() == self.task.id())
    }
}

/// Ordered view of one relay for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayGroup {
    /// Shared grouping id.
    pub parent_id: ParentId,
    /// Active legs from head to tail.
    pub chain: Vec<TaskId>,
    /// Every non-deleted leg in group order, closed legs included.
    pub members: Vec<TaskId>,
}

impl RelayGroup {
    /// Returns the first active leg, if any.
    #[must_use]
    pub fn head(&self) -> Option<TaskId> {
        self.chain.first().copied()
    }

    /// Returns the last active leg, if any.
    #[must_use]
    pub fn tail(&self) -> Option<TaskId> {
        self.chain.last().copied()
    }
}

/// A dropoff location that moves to the predecessor when a tail leg is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropoffTransfer {
    /// Leg that becomes the new tail.
    pub predecessor: TaskId,
    /// Location it inherits.
    pub location: Location,
}

/// Finds a task by identifier.
#[must_use]
pub fn find_existing_task(collection: &TaskCollection, id: TaskId) -> Option<&Task> {
    collection.get(id)
}

/// Finds a task and every leg sharing its parent id.
///
/// A task without a parent id forms a singleton group.
#[must_use]
pub fn find_existing_task_parent(collection: &TaskCollection, id: TaskId) -> Option<TaskGroup<'_>> {
    let task = collection.get(id)?;
    let members = match task.parent_id() {
        Some(parent) => {
            let mut members: Vec<&Task> = collection
                .iter()
                .filter(|member| member.parent_id() == Some(parent))
                .filter(|member| !member.is_deleted() || member.id() == id)
                .collect();
            members.sort_by(|a, b| group_sort(a, b));
            members
        }
        None => vec![task],
    };
    Some(TaskGroup { task, members })
}

/// Orders two legs of the same relay.
///
/// Sorts by `order_in_relay`, then creation time, then id, so display order
/// never changes between renders of the same data.
#[must_use]
pub fn group_sort(a: &Task, b: &Task) -> Ordering {
    a.order_in_relay()
        .cmp(&b.order_in_relay())
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Relinks the legs of one relay after its membership changed.
///
/// Cancelled, rejected and deleted legs lose their links but keep their parent
/// id and position; the remaining legs are renumbered from 1 in group order.
#[must_use]
pub fn reset_group_relay_uuids(collection: &TaskCollection, parent: ParentId) -> TaskCollection {
    collection.with_bulk_update(|tasks| relink_group(tasks, parent))
}

/// Relinks every relay in the collection.
#[must_use]
pub fn group_relays_together(collection: &TaskCollection) -> TaskCollection {
    let parents = collection.parent_ids();
    collection.with_bulk_update(|tasks| {
        for parent in parents {
            relink_group(tasks, parent);
        }
    })
}

/// Merges status-partitioned task lists into one collection.
///
/// A task id seen in several lists keeps the copy from the last list.
#[must_use]
pub fn convert_task_lists_to_objects<L>(lists: impl IntoIterator<Item = L>) -> TaskCollection
where
    L: IntoIterator<Item = Task>,
{
    TaskCollection::from_tasks(lists.into_iter().flatten())
}

/// Returns the ordered view of every relay.
#[must_use]
pub fn relay_groups(collection: &TaskCollection) -> Vec<RelayGroup> {
    collection
        .parent_ids()
        .into_iter()
        .map(|parent_id| {
            let mut members: Vec<&Task> = collection
                .active()
                .filter(|task| task.parent_id() == Some(parent_id))
                .collect();
            members.sort_by(|a, b| group_sort(a, b));
            let chain = members
                .iter()
                .filter(|task| task.is_relay_active())
                .map(|task| task.id())
                .collect();
            RelayGroup {
                parent_id,
                chain,
                members: members.iter().map(|task| task.id()).collect(),
            }
        })
        .collect()
}

/// Works out whether deleting `group.task` hands its dropoff to the previous leg.
///
/// Applies only when the deleted leg is the tail, has a predecessor and carries
/// a dropoff location.
#[must_use]
pub fn dropoff_transfer_on_delete(group: &TaskGroup<'_>) -> Option<DropoffTransfer> {
    let task = group.task;
    let location = task.dropoff_location()?;
    let predecessor = task.relay_previous_uuid()?;
    if !group.is_tail() {
        return None;
    }
    Some(DropoffTransfer {
        predecessor,
        location: location.clone(),
    })
}

fn relink_group(tasks: &mut HashMap<TaskId, Task>, parent: ParentId) {
    let mut chain: Vec<&Task> = Vec::new();
    let mut closed: Vec<TaskId> = Vec::new();
    for task in tasks.values().filter(|task| task.parent_id() == Some(parent)) {
        if task.is_relay_active() {
            chain.push(task);
        } else {
            closed.push(task.id());
        }
    }
    chain.sort_by(|a, b| group_sort(a, b));
    let order: Vec<TaskId> = chain.into_iter().map(Task::id).collect();

    for id in closed {
        if let Some(task) = tasks.get_mut(&id) {
            task.clear_relay_links();
        }
    }

    for (index, id) in order.iter().enumerate() {
        let previous = index.checked_sub(1).and_then(|prior| order.get(prior)).copied();
        let next = order.get(index + 1).copied();
        let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if let Some(task) = tasks.get_mut(id) {
            task.set_relay_links(position, previous, next);
        }
    }
}
