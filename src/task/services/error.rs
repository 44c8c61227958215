//! Service-level errors.

use crate::task::{
    domain::{NotificationId, TaskDomainError},
    ports::{FailureKind, RemoteStoreError},
};
use thiserror::Error;

/// Errors returned by the task lifecycle controller.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed before any remote call.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// A remote collaborator failed.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
    /// The notification was already undone or dismissed.
    #[error("notification {0} is no longer active")]
    NotificationExpired(NotificationId),
}

impl TaskLifecycleError {
    /// Classifies the error for presentation.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Domain(TaskDomainError::UnknownTask(_)) | Self::NotificationExpired(_) => {
                FailureKind::NotFound
            }
            Self::Domain(_) => FailureKind::Validation,
            Self::Remote(err) => FailureKind::from(err),
        }
    }
}

/// Result type for task lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Errors returned by the audit timeline service.
#[derive(Debug, Error)]
pub enum AuditTimelineError {
    /// The audit log failed.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}

impl AuditTimelineError {
    /// Classifies the error for presentation.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Remote(err) => FailureKind::from(err),
        }
    }
}
