//! Application services for the relay task controller.

mod activity;
mod assignment;
mod audit;
mod debounce;
mod error;
mod fields;
mod lifecycle;
mod sync;
mod transitions;

pub use activity::{ActivityGuard, ActivityTracker};
pub use audit::AuditTimelineService;
pub use debounce::Debouncer;
pub use error::{AuditTimelineError, TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::{CreateTaskRequest, LifecyclePorts, TaskLifecycleService, UpdateOutcome};
pub use sync::RefreshLoopHandle;
