//! Port contracts for the relay task controller.
//!
//! Ports define infrastructure-agnostic interfaces for the remote task
//! store, the user directory, the audit log, live updates and the
//! notification surface.

pub mod audit_log;
pub mod directory;
pub mod live_updates;
pub mod notifications;
pub mod remote_store;

pub use audit_log::AuditLogStore;
pub use directory::DirectoryStore;
pub use live_updates::{LiveUpdates, SubscriptionHandle};
pub use notifications::{FailureEvent, FailureKind, Intent, NotificationSink};
pub use remote_store::{
    CreatedTask, NewTaskPayload, PatchRecord, RemoteStoreError, RemoteStoreResult, SortDirection,
    TaskQuery, TaskRemoteStore,
};
