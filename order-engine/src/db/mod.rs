//! Database Module
//!
//! Handles the SQLite connection pool, migrations and units of work

pub mod repository;
pub mod transaction;

pub use transaction::{LockedOrder, TransactionManager, UnitOfWork};

use crate::core::{EngineConfig, EngineError, EngineResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;

/// Database service — owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the database at `config.database_path` and apply migrations
    pub async fn new(config: &EngineConfig) -> EngineResult<Self> {
        Self::open(&config.database_path, config).await
    }

    pub async fn open(db_path: &Path, config: &EngineConfig) -> EngineResult<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                EngineError::Persistence(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        // WAL, foreign keys, normal sync. busy_timeout is set per connection:
        // 写冲突时等待锁释放，而不是立即失败
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.lock_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.lock_timeout())
            .connect_with(options)
            .await
            .map_err(|e| EngineError::Persistence(format!("Failed to open database: {e}")))?;

        tracing::info!(
            path = %db_path.display(),
            lock_timeout_ms = config.lock_timeout_ms,
            "Database connection established (SQLite WAL)"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EngineError::Persistence(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
