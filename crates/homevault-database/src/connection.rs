//! SQLite connection pool management.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use homevault_core::config::DatabaseConfig;
use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;

/// Wrapper around the sqlx SQLite connection pool.
///
/// SQLite admits one writer at a time, and a deferred transaction that
/// starts as a reader fails outright when it later tries to write while
/// another writer holds the lock. Every write transaction therefore goes
/// through [`DatabasePool::begin_write`], which queues writers in-process.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: SqlitePool,
    /// Held for the lifetime of each write transaction.
    write_lock: Arc<Mutex<()>>,
}

/// A write transaction holding the process-wide writer lease.
///
/// Dereferences to the underlying connection, so repository functions
/// take it as `&mut *tx`. Dropping without [`commit`](Self::commit) rolls
/// back.
pub struct WriteTransaction {
    tx: Transaction<'static, Sqlite>,
    _lease: OwnedMutexGuard<()>,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Opening SQLite catalog"
        );

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid database URL '{}'", config.url),
                    e,
                )
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Successfully opened SQLite catalog");
        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out a connection for reads.
    pub async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })
    }

    /// Begin a write transaction, waiting for any other writer to finish.
    pub async fn begin_write(&self) -> AppResult<WriteTransaction> {
        let lease = Arc::clone(&self.write_lock).lock_owned().await;
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(WriteTransaction { tx, _lease: lease })
    }

    /// Run pending migrations against this pool.
    pub async fn migrate(&self) -> AppResult<()> {
        crate::migration::run_migrations(&self.pool).await
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

impl WriteTransaction {
    /// Commit and release the writer lease.
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    /// Roll back and release the writer lease.
    pub async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}
