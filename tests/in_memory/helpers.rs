//! Shared test helpers for in-memory controller integration tests.

use std::sync::Arc;

use courier_relay::{
    config::ControllerConfig,
    task::{
        adapters::memory::{
            InMemoryDirectory, InMemoryLiveUpdates, InMemoryTaskStore, RecordingNotificationSink,
        },
        domain::User,
        services::{LifecyclePorts, TaskLifecycleService},
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Remote store shared between controllers.
pub type SharedStore = Arc<InMemoryTaskStore<DefaultClock>>;

/// Controller type used by the integration tests.
pub type TestController = TaskLifecycleService<
    InMemoryTaskStore<DefaultClock>,
    InMemoryDirectory,
    DefaultClock,
>;

/// One signed-in client of the remote store.
pub struct Client {
    pub controller: TestController,
    pub directory: Arc<InMemoryDirectory>,
    pub sink: Arc<RecordingNotificationSink>,
    pub user: User,
}

/// Provides a fresh remote store for each test.
#[fixture]
pub fn store() -> SharedStore {
    Arc::new(InMemoryTaskStore::new(DefaultClock))
}

/// Signs `user` in against `store` with debouncing disabled.
#[must_use]
pub fn client(store: &SharedStore, user: User) -> Client {
    let directory = Arc::new(InMemoryDirectory::new(user.clone()));
    let sink = Arc::new(RecordingNotificationSink::new());
    let controller = TaskLifecycleService::new(
        LifecyclePorts {
            store: Arc::clone(store),
            directory: Arc::clone(&directory),
            live_updates: Arc::new(InMemoryLiveUpdates::new()),
            notifier: sink.clone(),
        },
        Arc::new(DefaultClock),
        ControllerConfig::default().without_debounce(),
    );
    Client {
        controller,
        directory,
        sink,
        user,
    }
}

/// Provides a signed-in dispatcher over a fresh store.
#[fixture]
pub fn dispatcher(store: SharedStore) -> (SharedStore, Client) {
    let client = client(&store, User::new("Dispatch"));
    (store, client)
}
