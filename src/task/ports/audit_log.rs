//! Audit log port.

use super::RemoteStoreResult;
use crate::task::domain::{AuditRecord, RecordOrder, TaskId};
use async_trait::async_trait;

/// Read access to the audit timeline of tasks.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Returns the records of one task in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`super::RemoteStoreError::NotFound`] when the task has no
    /// timeline and [`super::RemoteStoreError::Forbidden`] when the caller
    /// may not read it.
    async fn get_records(
        &self,
        task_id: TaskId,
        order: RecordOrder,
    ) -> RemoteStoreResult<Vec<AuditRecord>>;
}
