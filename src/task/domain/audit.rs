//! Audit timeline records.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a task's audit timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Task the record belongs to.
    pub task_id: TaskId,
    /// User who performed the action, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
    /// Action verb, e.g. `updated` or `assigned`.
    pub verb: String,
    /// Field touched by the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Free-form action payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Time the action was recorded.
    pub created_at: DateTime<Utc>,
}

/// Sort order for audit timelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    /// Most recent record first.
    #[default]
    Newest,
    /// Oldest record first.
    Oldest,
}
