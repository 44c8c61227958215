//! In-memory user and location directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Location, LocationId, Task, User, UserId},
    ports::{DirectoryStore, RemoteStoreError, RemoteStoreResult},
};

/// Thread-safe in-memory directory keyed on a fixed signed-in user.
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug)]
struct DirectoryState {
    current_user: UserId,
    users: HashMap<UserId, User>,
    assigned: HashMap<UserId, Vec<Task>>,
    locations: HashMap<LocationId, Location>,
}

impl InMemoryDirectory {
    /// Creates a directory whose signed-in user is `current_user`.
    #[must_use]
    pub fn new(current_user: User) -> Self {
        let current_id = current_user.id;
        let users = HashMap::from([(current_id, current_user)]);
        Self {
            state: Arc::new(RwLock::new(DirectoryState {
                current_user: current_id,
                users,
                assigned: HashMap::new(),
                locations: HashMap::new(),
            })),
        }
    }

    /// Adds or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the lock is poisoned.
    pub fn add_user(&self, user: User) -> RemoteStoreResult<()> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    /// Adds or replaces a saved location.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the lock is poisoned.
    pub fn add_location(&self, location: Location) -> RemoteStoreResult<()> {
        self.write()?.locations.insert(location.id, location);
        Ok(())
    }

    /// Replaces the tasks listed as assigned to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::Transport`] when the lock is poisoned.
    pub fn set_assigned_tasks(&self, user_id: UserId, tasks: Vec<Task>) -> RemoteStoreResult<()> {
        self.write()?.assigned.insert(user_id, tasks);
        Ok(())
    }

    fn read(&self) -> RemoteStoreResult<RwLockReadGuard<'_, DirectoryState>> {
        self.state
            .read()
            .map_err(|err| RemoteStoreError::transport(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RemoteStoreResult<RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|err| RemoteStoreError::transport(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn whoami(&self) -> RemoteStoreResult<User> {
        let state = self.read()?;
        state
            .users
            .get(&state.current_user)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound("signed-in user".to_owned()))
    }

    async fn get_user(&self, id: UserId) -> RemoteStoreResult<User> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(format!("user {id}")))
    }

    async fn get_assigned_tasks(&self, user_id: UserId) -> RemoteStoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .assigned
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_location(&self, id: LocationId) -> RemoteStoreResult<Location> {
        self.read()?
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(format!("location {id}")))
    }
}
