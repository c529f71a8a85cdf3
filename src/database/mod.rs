//! # Database Module
//!
//! Persistence for users and tasks behind the [`Storage`] trait, with a
//! PostgreSQL backend (tokio-postgres + deadpool) and an in-memory backend.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod store;

use std::sync::Arc;

use anyhow::Result;

use crate::config::DatabaseConfig;

pub use connection::DatabaseConnection;
pub use memory::MemoryStore;
pub use store::{Storage, StorageError, StorageResult};

/// Open the backend named by the configuration and bring its schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    if config.is_memory() {
        tracing::warn!("⚠️  Using in-memory storage; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = DatabaseConnection::new(config).await?;
    migrations::run_migrations(db.pool()).await?;
    Ok(Arc::new(db))
}
