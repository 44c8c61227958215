//! In-memory live update registry and recording notification sink.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::task::{
    domain::{Notification, NotificationId, TaskId},
    ports::{FailureEvent, LiveUpdates, NotificationSink, SubscriptionHandle},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live update source that only tracks which tasks are watched.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLiveUpdates {
    watchers: Arc<Mutex<HashMap<TaskId, usize>>>,
}

impl InMemoryLiveUpdates {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether any handle for `task_id` is live.
    #[must_use]
    pub fn is_watching(&self, task_id: TaskId) -> bool {
        lock(&self.watchers).get(&task_id).is_some_and(|count| *count > 0)
    }

    /// Returns the number of watched tasks.
    #[must_use]
    pub fn watched_count(&self) -> usize {
        lock(&self.watchers).values().filter(|count| **count > 0).count()
    }
}

impl LiveUpdates for InMemoryLiveUpdates {
    fn watch(&self, task_id: TaskId) -> SubscriptionHandle {
        *lock(&self.watchers).entry(task_id).or_default() += 1;
        let watchers = Arc::clone(&self.watchers);
        SubscriptionHandle::new(task_id, move || {
            let mut watchers = lock(&watchers);
            if let Some(count) = watchers.get_mut(&task_id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    watchers.remove(&task_id);
                }
            }
        })
    }
}

/// Notification sink that keeps everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
    failures: Arc<Mutex<Vec<FailureEvent>>>,
    dismissed: Arc<Mutex<Vec<NotificationId>>>,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifications surfaced so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    /// Returns the failures reported so far.
    #[must_use]
    pub fn failures(&self) -> Vec<FailureEvent> {
        lock(&self.failures).clone()
    }

    /// Returns the notifications dismissed so far.
    #[must_use]
    pub fn dismissed_ids(&self) -> Vec<NotificationId> {
        lock(&self.dismissed).clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: &Notification) {
        lock(&self.notifications).push(notification.clone());
    }

    fn failure(&self, event: &FailureEvent) {
        lock(&self.failures).push(event.clone());
    }

    fn dismissed(&self, id: NotificationId) {
        lock(&self.dismissed).push(id);
    }
}
