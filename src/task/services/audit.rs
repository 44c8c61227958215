//! Audit timeline retrieval.

use super::error::AuditTimelineError;
use crate::task::{
    domain::{AuditRecord, RecordOrder, TaskId},
    ports::{AuditLogStore, FailureEvent, Intent, NotificationSink},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads task audit timelines and reports failures like the controller does.
pub struct AuditTimelineService<L>
where
    L: AuditLogStore,
{
    log: Arc<L>,
    notifier: Arc<dyn NotificationSink>,
}

impl<L> AuditTimelineService<L>
where
    L: AuditLogStore,
{
    /// Creates a timeline service.
    #[must_use]
    pub fn new(log: Arc<L>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { log, notifier }
    }

    /// Returns the audit records of a task in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditTimelineError::Remote`] when the log is unreachable,
    /// the task has no timeline or the caller may not read it.
    pub async fn records(
        &self,
        task_id: TaskId,
        order: RecordOrder,
    ) -> Result<Vec<AuditRecord>, AuditTimelineError> {
        match self.log.get_records(task_id, order).await {
            Ok(records) => {
                debug!(task_id = %task_id, count = records.len(), ?order, "audit records loaded");
                Ok(records)
            }
            Err(source) => {
                let err = AuditTimelineError::from(source);
                let kind = err.failure_kind();
                warn!(task_id = %task_id, ?kind, error = %err, "audit log failed");
                self.notifier.failure(&FailureEvent {
                    intent: Intent::LoadAuditLog,
                    kind,
                    task_id: Some(task_id),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
