//! Database client for Yoyaku
//!
//! A thin wrapper over an `sqlx::Any` pool, so the session table can live in
//! SQLite locally and in another SQL database in deployment.

use crate::error::DbError;
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};
use yoyaku_config::DatabaseConfig;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database client for Yoyaku
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
}

impl DbClient {
    /// Create a new database client from a database configuration
    ///
    /// # Errors
    ///
    /// Fails when the URL is empty or the connection cannot be opened.
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.trim().is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        let max_connections = db_config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let pool = Self::create_pool(&db_config.url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Create a new database client from a database URL
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.trim().is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        let pool = Self::create_pool(db_url, DEFAULT_MAX_CONNECTIONS).await?;
        Ok(Self { pool })
    }

    fn is_in_memory(db_url: &str) -> bool {
        db_url.contains(":memory:") || db_url.contains("mode=memory")
    }

    /// Creates the SQLite file (and its directory) if it does not exist yet.
    fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        if db_path.is_empty() {
            return Ok(());
        }

        let path = Path::new(db_path);
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.exists() {
                debug!("Creating directory for SQLite database: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    error!("Failed to create directory for SQLite database: {}", e);
                    DbError::PoolError(format!("Failed to create directory: {}", e))
                })?;
            }
        }
        if !path.exists() {
            debug!("Creating empty SQLite database file: {}", db_path);
            std::fs::File::create(path).map_err(|e| {
                error!("Failed to create SQLite database file: {}", e);
                DbError::PoolError(format!("Failed to create database file: {}", e))
            })?;
        }
        Ok(())
    }

    async fn create_pool(db_url: &str, max_connections: u32) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        sqlx::any::install_default_drivers();

        let in_memory = Self::is_in_memory(db_url);
        if db_url.starts_with("sqlite:") && !in_memory {
            Self::ensure_sqlite_file(db_url)?;
        }

        // Every connection to `sqlite::memory:` opens its own database, so an
        // in-memory pool must keep exactly one connection alive.
        let base = PoolOptions::<sqlx::Any>::new().acquire_timeout(Duration::from_secs(3));
        let pool_options = if in_memory {
            base.max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            base.max_connections(max_connections.max(1))
                .idle_timeout(Duration::from_secs(600))
        };

        let pool = pool_options
            .connect_with(sqlx::any::AnyConnectOptions::from_str(db_url)?)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// Execute a statement that returns no rows. Returns the affected row count.
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
