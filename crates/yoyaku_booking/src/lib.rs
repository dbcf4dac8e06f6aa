// --- File: crates/yoyaku_booking/src/lib.rs ---
//! Booking surface of Yoyaku: the write transaction, the LINE session
//! bridge, reminder sweeps and the axum routes that expose them.

pub mod auth;
pub mod availability;
pub mod booking;
pub mod cache;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod referral;
pub mod reminder;
pub mod routes;
pub mod session;
#[cfg(test)]
mod booking_test;
#[cfg(test)]
mod test_support;

pub use auth::ADMIN_AUTH_HEADER;
pub use availability::{AvailabilityService, MAX_RANGE_DAYS};
pub use booking::{BookingRequest, BookingResponse, BookingService};
pub use cache::AvailabilityCache;
pub use error::{BookingError, ErrorKind};
pub use handlers::{BookingState, Collaborators};
pub use reminder::{ReminderRunReport, ReminderService, SweepKind, SweepReport};
pub use session::{SessionBridge, SessionEvent};
