//! Storage interface
//!
//! Row-level persistence for users and tasks. Handlers never talk to a
//! backend directly; they go through `Arc<dyn Storage>` so Postgres and the
//! in-memory store are interchangeable.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{NewUser, Task, User};

#[derive(Debug, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("database error: {0}")]
    Database(tokio_postgres::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
            let detail = err
                .as_db_error()
                .and_then(|db| db.constraint().map(str::to_string))
                .unwrap_or_else(|| "unique".to_string());
            StorageError::Conflict(detail)
        } else {
            StorageError::Database(err)
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a user by login handle (normalised email)
    async fn find_user_by_handle(&self, email: &str) -> StorageResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Insert a new user. Fails with [`StorageError::Conflict`] if the
    /// handle is already taken.
    async fn insert_user(&self, user: NewUser) -> StorageResult<User>;

    async fn find_task_by_id(&self, id: Uuid) -> StorageResult<Option<Task>>;

    async fn insert_task(&self, task: Task) -> StorageResult<Task>;

    /// Persist a modified task. Returns `None` if no row with this id and
    /// owner exists any more.
    async fn update_task(&self, task: &Task) -> StorageResult<Option<Task>>;

    /// Returns whether a row owned by `owner` was deleted.
    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StorageResult<bool>;

    /// All tasks of `owner`, oldest first
    async fn list_tasks_for_user(&self, owner: Uuid) -> StorageResult<Vec<Task>>;

    /// Cheap connectivity check for the health endpoint
    async fn health_check(&self) -> StorageResult<()>;
}
