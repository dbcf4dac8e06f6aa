// --- File: crates/yoyaku_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod features; // Runtime feature checks
pub mod http; // HTTP utilities
pub mod local; // Process-local collaborator implementations
pub mod logging; // Logging utilities
pub mod models; // Canonical booking models
pub mod services; // Collaborator abstractions
#[cfg(any(test, feature = "test-util"))]
pub mod test_util; // Recording doubles

#[cfg(test)]
mod local_test;

// Re-export error types and utilities for easier access
pub use error::{AlertError, HttpStatusCode, IdentityError, NotifyError, StoreError};

// Re-export HTTP utilities for easier access
pub use http::{client::HTTP_CLIENT, error_response};

pub use features::is_feature_enabled;
