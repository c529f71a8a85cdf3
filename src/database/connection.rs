// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool,
// and implements the `Storage` trait on top of the pool.
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{FromRow, NewUser, Task, User};
use crate::database::store::{Storage, StorageResult};

const SELECT_USER_BY_EMAIL: &str =
    "SELECT id, email, password_hash, is_active, created_at FROM users WHERE email = $1";
const SELECT_USER_BY_ID: &str =
    "SELECT id, email, password_hash, is_active, created_at FROM users WHERE id = $1";
const INSERT_USER: &str = "INSERT INTO users (id, email, password_hash, is_active, created_at) \
     VALUES ($1, $2, $3, TRUE, $4) \
     RETURNING id, email, password_hash, is_active, created_at";

const SELECT_TASK_BY_ID: &str = "SELECT id, user_id, title, description, completed, created_at, updated_at \
     FROM tasks WHERE id = $1";
const INSERT_TASK: &str = "INSERT INTO tasks (id, user_id, title, description, completed, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) \
     RETURNING id, user_id, title, description, completed, created_at, updated_at";
const UPDATE_TASK: &str = "UPDATE tasks SET title = $3, description = $4, completed = $5, updated_at = $6 \
     WHERE id = $1 AND user_id = $2 \
     RETURNING id, user_id, title, description, completed, created_at, updated_at";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = $1 AND user_id = $2";
const LIST_TASKS_FOR_USER: &str = "SELECT id, user_id, title, description, completed, created_at, updated_at \
     FROM tasks WHERE user_id = $1 ORDER BY created_at, id";

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new database connection with the provided configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pg_config = tokio_postgres::Config::from_str(&config.url)
            .context("Failed to parse DATABASE_URL")?;

        let masked_host = format!(
            "{:?}:{:?}/{}",
            pg_config.get_hosts().first(),
            pg_config.get_ports().first(),
            pg_config.get_dbname().unwrap_or_default()
        );
        tracing::info!("🔌 Connecting to database: {}", masked_host);

        // Enable SSL using native-tls; sslmode in the URL still decides whether it is required
        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .wait_timeout(Some(config.timeout))
            .create_timeout(Some(config.timeout))
            .recycle_timeout(Some(config.timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;
        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        tracing::info!("✅ Database connection established successfully");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl Storage for DatabaseConnection {
    async fn find_user_by_handle(&self, email: &str) -> StorageResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(SELECT_USER_BY_EMAIL, &[&email])
            .await?;
        Ok(row.map(|r| User::from_row(&r)).transpose()?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(SELECT_USER_BY_ID, &[&id])
            .await?;
        Ok(row.map(|r| User::from_row(&r)).transpose()?)
    }

    async fn insert_user(&self, user: NewUser) -> StorageResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                INSERT_USER,
                &[&user.id, &user.email, &user.password_hash, &user.created_at],
            )
            .await?;
        Ok(User::from_row(&row)?)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StorageResult<Option<Task>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(SELECT_TASK_BY_ID, &[&id])
            .await?;
        Ok(row.map(|r| Task::from_row(&r)).transpose()?)
    }

    async fn insert_task(&self, task: Task) -> StorageResult<Task> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                INSERT_TASK,
                &[
                    &task.id,
                    &task.user_id,
                    &task.title,
                    &task.description,
                    &task.completed,
                    &task.created_at,
                    &task.updated_at,
                ],
            )
            .await?;
        Ok(Task::from_row(&row)?)
    }

    async fn update_task(&self, task: &Task) -> StorageResult<Option<Task>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                UPDATE_TASK,
                &[
                    &task.id,
                    &task.user_id,
                    &task.title,
                    &task.description,
                    &task.completed,
                    &task.updated_at,
                ],
            )
            .await?;
        Ok(row.map(|r| Task::from_row(&r)).transpose()?)
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StorageResult<bool> {
        let client = self.pool.get().await?;
        let n = client
            .execute(DELETE_TASK, &[&id, &owner])
            .await?;
        Ok(n > 0)
    }

    async fn list_tasks_for_user(&self, owner: Uuid) -> StorageResult<Vec<Task>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(LIST_TASKS_FOR_USER, &[&owner])
            .await?;
        Ok(rows
            .iter()
            .map(Task::from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let client = self.pool.get().await?;
        client.query("SELECT 1", &[]).await?;
        Ok(())
    }
}
