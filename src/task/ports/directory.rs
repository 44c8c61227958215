//! User and saved-location directory port.

use super::RemoteStoreResult;
use crate::task::domain::{Location, LocationId, Task, User, UserId};
use async_trait::async_trait;

/// Directory of users, their assigned tasks and saved locations.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Returns the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`super::RemoteStoreError`] when the directory is unreachable.
    async fn whoami(&self) -> RemoteStoreResult<User>;

    /// Fetches a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::RemoteStoreError::NotFound`] for unknown users.
    async fn get_user(&self, id: UserId) -> RemoteStoreResult<User>;

    /// Lists tasks assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns [`super::RemoteStoreError`] when the listing fails.
    async fn get_assigned_tasks(&self, user_id: UserId) -> RemoteStoreResult<Vec<Task>>;

    /// Fetches a saved location.
    ///
    /// # Errors
    ///
    /// Returns [`super::RemoteStoreError::NotFound`] for unknown locations.
    async fn get_location(&self, id: LocationId) -> RemoteStoreResult<Location>;
}
