// --- File: crates/yoyaku_availability/src/error.rs ---
use thiserror::Error;

/// Errors raised while building the rule set from configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid weekday '{0}'")]
    InvalidWeekday(String),
    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),
    #[error("invalid business hours {open}-{close}")]
    InvalidBusinessHours { open: u32, close: u32 },
    #[error("invalid fixed rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },
}
