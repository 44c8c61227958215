//! In-memory audit log.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{AuditRecord, RecordOrder, TaskId},
    ports::{AuditLogStore, RemoteStoreError, RemoteStoreResult},
};

/// Thread-safe in-memory audit log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    state: Arc<RwLock<AuditState>>,
}

#[derive(Debug, Default)]
struct AuditState {
    records: HashMap<TaskId, Vec<AuditRecord>>,
    restricted: HashSet<TaskId>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to its task's timeline.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the lock is poisoned.
    pub fn record(&self, record: AuditRecord) -> RemoteStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            RemoteStoreError::transport(std::io::Error::other(err.to_string()))
        })?;
        state.records.entry(record.task_id).or_default().push(record);
        Ok(())
    }

    /// Denies reads of a task's timeline.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the lock is poisoned.
    pub fn restrict(&self, task_id: TaskId) -> RemoteStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            RemoteStoreError::transport(std::io::Error::other(err.to_string()))
        })?;
        state.restricted.insert(task_id);
        Ok(())
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLog {
    async fn get_records(
        &self,
        task_id: TaskId,
        order: RecordOrder,
    ) -> RemoteStoreResult<Vec<AuditRecord>> {
        let state = self.state.read().map_err(|err| {
            RemoteStoreError::transport(std::io::Error::other(err.to_string()))
        })?;
        if state.restricted.contains(&task_id) {
            return Err(RemoteStoreError::Forbidden(format!("timeline of task {task_id}")));
        }
        let mut records = state
            .records
            .get(&task_id)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(format!("timeline of task {task_id}")))?;
        records.sort_by_key(|record| record.created_at);
        if order == RecordOrder::Newest {
            records.reverse();
        }
        Ok(records)
    }
}
