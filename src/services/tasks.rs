//! Task Service
//!
//! Task CRUD scoped to the authenticated user. Every operation first checks
//! that the `user_id` addressed in the path is the caller (`Forbidden`
//! otherwise), then only ever discloses or mutates tasks whose owner is the
//! caller. A task owned by someone else is reported as `NotFound`, exactly
//! like a task that does not exist.
//!
//! Routing stays purely structural; this is the only place the comparison
//! happens.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::Storage;
use crate::database::models::{NewTask, Task, TaskChanges};
use crate::error::AppError;

pub struct TaskService {
    store: Arc<dyn Storage>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// The path user must be the authenticated user.
    fn scope(auth: &AuthUser, path_user_id: Uuid) -> Result<Uuid, AppError> {
        if auth.id != path_user_id {
            tracing::warn!(
                "User {} attempted to address tasks of user {}",
                auth.id,
                path_user_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(auth.id)
    }

    /// Fetch a task and hide it unless `owner` owns it.
    async fn owned_task(&self, owner: Uuid, task_id: Uuid) -> Result<Task, AppError> {
        match self.store.find_task_by_id(task_id).await? {
            Some(task) if task.user_id == owner => Ok(task),
            _ => Err(AppError::NotFound),
        }
    }

    pub async fn list_tasks(&self, auth: &AuthUser, path_user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let owner = Self::scope(auth, path_user_id)?;
        Ok(self.store.list_tasks_for_user(owner).await?)
    }

    pub async fn create_task(
        &self,
        auth: &AuthUser,
        path_user_id: Uuid,
        new: NewTask,
    ) -> Result<Task, AppError> {
        let owner = Self::scope(auth, path_user_id)?;
        let task = self.store.insert_task(Task::create(owner, new)).await?;
        tracing::info!("📝 User {} created task {}", owner, task.id);
        Ok(task)
    }

    pub async fn get_task(
        &self,
        auth: &AuthUser,
        path_user_id: Uuid,
        task_id: Uuid,
    ) -> Result<Task, AppError> {
        let owner = Self::scope(auth, path_user_id)?;
        self.owned_task(owner, task_id).await
    }

    pub async fn update_task(
        &self,
        auth: &AuthUser,
        path_user_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> Result<Task, AppError> {
        let owner = Self::scope(auth, path_user_id)?;
        let mut task = self.owned_task(owner, task_id).await?;
        task.apply(changes);

        // None: the task was deleted between the read and the write
        self.store.update_task(&task).await?.ok_or(AppError::NotFound)
    }

    pub async fn delete_task(
        &self,
        auth: &AuthUser,
        path_user_id: Uuid,
        task_id: Uuid,
    ) -> Result<(), AppError> {
        let owner = Self::scope(auth, path_user_id)?;
        self.owned_task(owner, task_id).await?;

        if self.store.delete_task(owner, task_id).await? {
            tracing::info!("🗑️  User {} deleted task {}", owner, task_id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
