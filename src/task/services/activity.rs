//! In-flight activity tracking used to defer background refreshes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counters for work in flight plus an idle flag.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    fetches: AtomicUsize,
    priority_updates: AtomicUsize,
    idle: AtomicBool,
}

/// Decrements its counter when dropped.
#[derive(Debug)]
#[must_use = "activity is only tracked while the guard is alive"]
pub struct ActivityGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ActivityTracker {
    /// Creates a tracker with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a task fetch as in flight.
    pub fn begin_fetch(&self) -> ActivityGuard<'_> {
        self.fetches.fetch_add(1, Ordering::AcqRel);
        ActivityGuard {
            counter: &self.fetches,
        }
    }

    /// Marks a priority update as in flight.
    pub fn begin_priority_update(&self) -> ActivityGuard<'_> {
        self.priority_updates.fetch_add(1, Ordering::AcqRel);
        ActivityGuard {
            counter: &self.priority_updates,
        }
    }

    /// Returns whether any fetch is in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.fetches.load(Ordering::Acquire) > 0
    }

    /// Returns whether any priority update is in flight.
    #[must_use]
    pub fn is_updating_priority(&self) -> bool {
        self.priority_updates.load(Ordering::Acquire) > 0
    }

    /// Records whether the user is idle.
    pub fn set_idle(&self, idle: bool) {
        self.idle.store(idle, Ordering::Release);
    }

    /// Returns whether the user is idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle.load(Ordering::Acquire)
    }

    /// Returns whether a background refresh should wait.
    #[must_use]
    pub fn should_defer_refresh(&self) -> bool {
        self.is_idle() || self.is_fetching() || self.is_updating_priority()
    }
}
