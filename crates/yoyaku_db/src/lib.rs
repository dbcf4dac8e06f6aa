//! Database integration for Yoyaku
//!
//! Holds LINE booking sessions in a dedicated SQL table, apart from the
//! booking calendar. Uses SQLx's `Any` driver; SQLite is the default
//! backend and `sqlite::memory:` works for tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use yoyaku_db::{DbClient, SqlSessionStore};
//!
//! async fn setup() -> Result<SqlSessionStore, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite://yoyaku_sessions.db").await?;
//!     let store = SqlSessionStore::new(db_client);
//!     store.init_schema().await?;
//!     Ok(store)
//! }
//! ```

pub mod client;
pub mod error;
pub mod sessions;

// Register the SQLite driver when the crate is loaded
#[cfg(feature = "sqlite")]
mod sqlite_driver {
    // This import ensures the SQLite driver is linked and registered
    #[allow(unused_imports)]
    use sqlx::sqlite::SqlitePoolOptions as _;
}

pub use client::DbClient;
pub use error::DbError;
pub use sessions::SqlSessionStore;
