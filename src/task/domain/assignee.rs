//! Users and their assignment to tasks.

use super::{AssignmentId, ParseAssigneeRoleError, TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a user holds on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeRole {
    /// Carries the items.
    Rider,
    /// Coordinates the delivery.
    Coordinator,
}

impl AssigneeRole {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for AssigneeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AssigneeRole {
    type Error = ParseAssigneeRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rider" => Ok(Self::Rider),
            "coordinator" => Ok(Self::Coordinator),
            _ => Err(ParseAssigneeRoleError(value.to_owned())),
        }
    }
}

/// Join record linking a task to a user in a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignee {
    /// Assignment identifier.
    pub id: AssignmentId,
    /// Assigned task.
    pub task_id: TaskId,
    /// Assigned user.
    pub assignee_id: UserId,
    /// Role of the user on the task.
    pub role: AssigneeRole,
}

impl TaskAssignee {
    /// Creates a new assignment with a fresh identifier.
    #[must_use]
    pub fn new(task_id: TaskId, assignee_id: UserId, role: AssigneeRole) -> Self {
        Self {
            id: AssignmentId::new(),
            task_id,
            assignee_id,
            role,
        }
    }
}

/// Directory entry for a rider or coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Name shown on assignment chips.
    pub display_name: String,
    /// Rider responsibility label, e.g. a patch or area name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_responsibility: Option<String>,
    /// Roles the user may take.
    #[serde(default)]
    pub roles: Vec<AssigneeRole>,
}

impl User {
    /// Creates a user holding both roles.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
            rider_responsibility: None,
            roles: vec![AssigneeRole::Rider, AssigneeRole::Coordinator],
        }
    }

    /// Sets the rider responsibility label.
    #[must_use]
    pub fn with_rider_responsibility(mut self, label: impl Into<String>) -> Self {
        self.rider_responsibility = Some(label.into());
        self
    }
}
