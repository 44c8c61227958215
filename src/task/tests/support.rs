//! Shared fixtures for controller tests.

use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::task::{
    adapters::memory::{
        InMemoryDirectory, InMemoryLiveUpdates, InMemoryTaskStore, RecordingNotificationSink,
    },
    domain::{ParentId, PersistedTaskData, Task, TaskId, TaskStatus, User},
    services::{LifecyclePorts, TaskLifecycleService},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::fixture;

pub(super) type TestStore = InMemoryTaskStore<DefaultClock>;
pub(super) type TestService = TaskLifecycleService<TestStore, InMemoryDirectory, DefaultClock>;

/// Controller wired to in-memory adapters, with handles to each of them.
pub(super) struct Harness {
    pub service: TestService,
    pub store: Arc<TestStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub live_updates: Arc<InMemoryLiveUpdates>,
    pub sink: Arc<RecordingNotificationSink>,
    pub coordinator: User,
}

pub(super) fn harness_with(config: ControllerConfig) -> Harness {
    let coordinator = User::new("Dispatch");
    let store = Arc::new(InMemoryTaskStore::new(DefaultClock));
    let directory = Arc::new(InMemoryDirectory::new(coordinator.clone()));
    let live_updates = Arc::new(InMemoryLiveUpdates::new());
    let sink = Arc::new(RecordingNotificationSink::new());
    let service = TaskLifecycleService::new(
        LifecyclePorts {
            store: Arc::clone(&store),
            directory: Arc::clone(&directory),
            live_updates: live_updates.clone(),
            notifier: sink.clone(),
        },
        Arc::new(DefaultClock),
        config,
    );
    Harness {
        service,
        store,
        directory,
        live_updates,
        sink,
        coordinator,
    }
}

#[fixture]
pub(super) fn harness() -> Harness {
    harness_with(ControllerConfig::default().without_debounce())
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("valid base time")
}

pub(super) fn parent(raw: u64) -> ParentId {
    ParentId::from_raw(raw).expect("non-zero parent id")
}

/// Builds a stored relay leg created `minutes` after the base time.
pub(super) fn leg(parent_id: Option<ParentId>, order: u32, minutes: i64) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        status: TaskStatus::Active,
        created_at: base_time() + Duration::minutes(minutes),
        parent_id,
        order_in_relay: order,
        ..PersistedTaskData::default()
    })
}

impl Harness {
    /// Creates a task and then `extra_legs` relay legs after it, returning
    /// the legs head first.
    pub async fn relay(&self, extra_legs: usize) -> Vec<Task> {
        let head = self
            .service
            .create_task(crate::task::services::CreateTaskRequest::new())
            .await
            .expect("head leg should be created");
        let mut legs = vec![head];
        for _ in 0..extra_legs {
            let previous = legs.last().map(Task::id).expect("relay has a leg");
            let next = self
                .service
                .create_relay_leg(previous)
                .await
                .expect("relay leg should be created");
            legs.push(next);
        }
        legs
    }

    pub fn local(&self, id: TaskId) -> Task {
        self.service.task(id).expect("task should be in the collection")
    }
}
