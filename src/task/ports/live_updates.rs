//! Live update subscriptions for individual tasks.

use crate::task::domain::TaskId;
use std::fmt;

/// Source of server-pushed changes for watched tasks.
pub trait LiveUpdates: Send + Sync {
    /// Starts watching a task. The watch ends when the handle is cancelled
    /// or dropped.
    fn watch(&self, task_id: TaskId) -> SubscriptionHandle;
}

type CancelFn = Box<dyn FnOnce() + Send + Sync>;

/// Cancellable handle for one task watch.
pub struct SubscriptionHandle {
    task_id: TaskId,
    on_cancel: Option<CancelFn>,
}

impl SubscriptionHandle {
    /// Creates a handle that runs `on_cancel` exactly once on teardown.
    #[must_use]
    pub fn new(task_id: TaskId, on_cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            task_id,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    /// Returns the watched task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Ends the watch now.
    pub fn cancel(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("task_id", &self.task_id)
            .field("active", &self.on_cancel.is_some())
            .finish()
    }
}
