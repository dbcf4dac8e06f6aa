// --- File: crates/yoyaku_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! The booking core talks to the record store, the session store, the
//! identity provider, the notifier and the alert sink only through these
//! traits, so every one of them can be swapped for an in-memory version.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

use crate::error::{AlertError, IdentityError, NotifyError, StoreError};
use crate::models::{
    BookingRecord, BookingSession, ExternalIdentity, NewBookingRecord, OperationalAlert,
    RecordPatch,
};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Generic event store holding booking records.
pub trait EventStore: Send + Sync {
    /// All records (any status) overlapping the half-open range `[range_start, range_end)`.
    fn query_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError>;

    /// Reads one record back. `Ok(None)` when the id is unknown.
    fn get_event(&self, id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError>;

    /// Writes a new record and returns it with the store-assigned id.
    fn create_event(&self, fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError>;

    /// Partial update.
    fn update_event(&self, id: &str, patch: RecordPatch)
        -> BoxFuture<'_, BookingRecord, StoreError>;

    fn delete_event(&self, id: &str) -> BoxFuture<'_, (), StoreError>;
}

/// Dedicated store for LINE booking sessions, kept apart from the calendar.
pub trait SessionStore: Send + Sync {
    fn insert_session(&self, session: BookingSession) -> BoxFuture<'_, (), StoreError>;

    fn find_session(&self, token: &str) -> BoxFuture<'_, Option<BookingSession>, StoreError>;

    /// Atomically moves a pending session to redeemed and attaches the booking id.
    ///
    /// Returns `false` when the session was not pending at the time of the
    /// call, i.e. somebody else redeemed it first.
    fn mark_redeemed(
        &self,
        token: &str,
        booking_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> BoxFuture<'_, bool, StoreError>;

    /// Deletes every session created before `created_before`. Returns the count.
    fn delete_stale(&self, created_before: DateTime<Utc>) -> BoxFuture<'_, usize, StoreError>;
}

/// OAuth login against an external identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Where to send the customer to start a login carrying `state`.
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError>;

    /// Exchanges an authorization code for an identity.
    fn exchange_auth_code(&self, code: &str) -> BoxFuture<'_, ExternalIdentity, IdentityError>;
}

/// Pushes a text message to an external identity.
pub trait Notifier: Send + Sync {
    fn push_notification(&self, identity_id: &str, text: &str) -> BoxFuture<'_, (), NotifyError>;
}

/// Best-effort operational alert channel.
pub trait AlertSink: Send + Sync {
    fn send_operational_alert(&self, alert: OperationalAlert) -> BoxFuture<'_, (), AlertError>;
}
