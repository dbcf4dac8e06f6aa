//! Error types for the database client

use thiserror::Error;
use yoyaku_common::StoreError;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored row could not be turned back into a model
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::CorruptRow(message) => StoreError::Malformed(message),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}
