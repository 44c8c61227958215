//! In-memory adapters for controller tests and local runs.

mod audit_log;
mod directory;
mod live_updates;
mod task_store;

pub use audit_log::InMemoryAuditLog;
pub use directory::InMemoryDirectory;
pub use live_updates::{InMemoryLiveUpdates, RecordingNotificationSink};
pub use task_store::InMemoryTaskStore;
