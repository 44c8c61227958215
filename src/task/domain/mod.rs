//! Domain model for delivery tasks and relays.
//!
//! The task domain models delivery legs, their lifecycle status, relay
//! grouping and user-facing notifications while keeping every remote
//! collaborator outside of the domain boundary.

mod assignee;
mod audit;
mod collection;
mod error;
mod ids;
mod location;
mod notification;
mod patch;
pub mod relay;
mod task;

pub use assignee::{AssigneeRole, TaskAssignee, User};
pub use audit::{AuditRecord, RecordOrder};
pub use collection::TaskCollection;
pub use error::{ParseAssigneeRoleError, ParseTaskStatusError, TaskDomainError};
pub use ids::{AssignmentId, Etag, LocationId, ParentId, TaskId, UserId};
pub use location::{Location, RequesterContact};
pub use notification::{Notification, NotificationId, UndoAction};
pub use patch::{PatchField, TaskPatch};
pub use relay::{DropoffTransfer, RelayGroup, TaskGroup};
pub use task::{PersistedTaskData, Priority, Task, TaskStatus};
