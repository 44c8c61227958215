//! Shared world state for relay relinking BDD scenarios.

use std::sync::Arc;

use courier_relay::{
    config::ControllerConfig,
    task::{
        adapters::memory::{
            InMemoryDirectory, InMemoryLiveUpdates, InMemoryTaskStore, RecordingNotificationSink,
        },
        domain::{Task, TaskId, User},
        services::{LifecyclePorts, TaskLifecycleService},
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type RelayService =
    TaskLifecycleService<InMemoryTaskStore<DefaultClock>, InMemoryDirectory, DefaultClock>;

/// Scenario world for relay relinking behaviour tests.
pub struct RelayWorld {
    pub service: RelayService,
    pub store: Arc<InMemoryTaskStore<DefaultClock>>,
    pub sink: Arc<RecordingNotificationSink>,
    pub legs: Vec<TaskId>,
}

impl RelayWorld {
    /// Creates a world with an empty controller.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new(DefaultClock));
        let sink = Arc::new(RecordingNotificationSink::new());
        let service = TaskLifecycleService::new(
            LifecyclePorts {
                store: Arc::clone(&store),
                directory: Arc::new(InMemoryDirectory::new(User::new("Dispatch"))),
                live_updates: Arc::new(InMemoryLiveUpdates::new()),
                notifier: sink.clone(),
            },
            Arc::new(DefaultClock),
            ControllerConfig::default().without_debounce(),
        );

        Self {
            service,
            store,
            sink,
            legs: Vec::new(),
        }
    }

    /// Returns the id of the 1-based leg `position`.
    ///
    /// # Errors
    ///
    /// Returns an error when the relay has fewer legs.
    pub fn leg_id(&self, position: usize) -> Result<TaskId, eyre::Report> {
        position
            .checked_sub(1)
            .and_then(|index| self.legs.get(index))
            .copied()
            .ok_or_else(|| eyre::eyre!("relay has no leg {position}"))
    }

    /// Returns the local copy of the 1-based leg `position`.
    ///
    /// # Errors
    ///
    /// Returns an error when the leg is unknown.
    pub fn leg(&self, position: usize) -> Result<Task, eyre::Report> {
        let id = self.leg_id(position)?;
        self.service
            .task(id)
            .ok_or_else(|| eyre::eyre!("leg {position} missing from the collection"))
    }
}

impl Default for RelayWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RelayWorld {
    RelayWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
