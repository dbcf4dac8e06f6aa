// --- File: crates/yoyaku_common/src/error.rs ---
use thiserror::Error;

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

/// Failures of the external record store (calendar, session table, memory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Failures exchanging an authorization code for an identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("profile lookup failed: {0}")]
    ProfileFailed(String),
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("authorization request could not be built: {0}")]
    InvalidRequest(String),
}

/// Best-effort notification failure. Never surfaced as a booking failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Operational alert delivery failure. Callers log and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("alert rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("alert transport failed: {0}")]
    Transport(String),
}
