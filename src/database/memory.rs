//! In-memory storage backend
//!
//! Selected with `DATABASE_URL=memory`. Data lives for the lifetime of the
//! process. Handle uniqueness is enforced through the dashmap entry API so
//! two concurrent registrations of the same email cannot both succeed.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::database::models::{NewUser, Task, User};
use crate::database::store::{Storage, StorageError, StorageResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// email -> user id
    handles: DashMap<String, Uuid>,
    tasks: DashMap<Uuid, Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn set_active(&self, id: Uuid, active: bool) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_active = active;
        }
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find_user_by_handle(&self, email: &str) -> StorageResult<Option<User>> {
        let Some(id) = self.handles.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn insert_user(&self, user: NewUser) -> StorageResult<User> {
        match self.handles.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict("users_email_key".to_string())),
            Entry::Vacant(slot) => {
                let user = user.into_user();
                // users is written before the handle is published so readers
                // never see a handle without its user
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_task_by_id(&self, id: Uuid) -> StorageResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|task| task.value().clone()))
    }

    async fn insert_task(&self, task: Task) -> StorageResult<Task> {
        match self.tasks.entry(task.id) {
            Entry::Occupied(_) => Err(StorageError::Conflict("tasks_pkey".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(task)
            }
        }
    }

    async fn update_task(&self, task: &Task) -> StorageResult<Option<Task>> {
        match self.tasks.get_mut(&task.id) {
            Some(mut stored) if stored.user_id == task.user_id => {
                *stored = task.clone();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StorageResult<bool> {
        Ok(self
            .tasks
            .remove_if(&id, |_, task| task.user_id == owner)
            .is_some())
    }

    async fn list_tasks_for_user(&self, owner: Uuid) -> StorageResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.user_id == owner)
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
