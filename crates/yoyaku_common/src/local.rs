// --- File: crates/yoyaku_common/src/local.rs ---
//! Process-local implementations of the collaborator traits.
//!
//! Used when the matching external service is disabled in configuration.
//! The recording doubles from [`crate::test_util`] are re-exported here for
//! tests.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AlertError, IdentityError, NotifyError, StoreError};
use crate::models::{
    BookingRecord, BookingSession, ExternalIdentity, NewBookingRecord, OperationalAlert,
    RecordPatch, SessionState,
};
use crate::services::{
    AlertSink, BoxFuture, EventStore, IdentityProvider, Notifier, SessionStore,
};

#[cfg(any(test, feature = "test-util"))]
pub use crate::test_util::{RecordingAlertSink, RecordingNotifier, StaticIdentityProvider};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// In-memory event store. Ids look like `mem-event-{uuid}`.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<HashMap<String, BookingRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records, keyed by their ids.
    pub fn with_records(records: impl IntoIterator<Item = BookingRecord>) -> Self {
        let events = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            events: Mutex::new(events),
        }
    }

    /// All records ordered by start time.
    pub fn snapshot(&self) -> Vec<BookingRecord> {
        let mut records: Vec<BookingRecord> = match self.events.lock() {
            Ok(events) => events.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        records.sort_by_key(|record| record.start_at);
        records
    }
}

impl EventStore for InMemoryEventStore {
    fn query_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError> {
        Box::pin(async move {
            let events = lock(&self.events)?;
            let mut found: Vec<BookingRecord> = events
                .values()
                .filter(|record| record.overlaps(range_start, range_end))
                .cloned()
                .collect();
            found.sort_by_key(|record| record.start_at);
            Ok(found)
        })
    }

    fn get_event(&self, id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(lock(&self.events)?.get(&id).cloned()) })
    }

    fn create_event(&self, fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError> {
        Box::pin(async move {
            let id = format!("mem-event-{}", Uuid::new_v4());
            let record = fields.into_record(id.clone());
            lock(&self.events)?.insert(id, record.clone());
            Ok(record)
        })
    }

    fn update_event(
        &self,
        id: &str,
        patch: RecordPatch,
    ) -> BoxFuture<'_, BookingRecord, StoreError> {
        let id = id.to_string();
        Box::pin(async move {
            let mut events = lock(&self.events)?;
            let record = events
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.apply_to(record);
            Ok(record.clone())
        })
    }

    fn delete_event(&self, id: &str) -> BoxFuture<'_, (), StoreError> {
        let id = id.to_string();
        Box::pin(async move {
            lock(&self.events)?
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::NotFound(id))
        })
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, BookingSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert_session(&self, session: BookingSession) -> BoxFuture<'_, (), StoreError> {
        Box::pin(async move {
            lock(&self.sessions)?.insert(session.token.clone(), session);
            Ok(())
        })
    }

    fn find_session(&self, token: &str) -> BoxFuture<'_, Option<BookingSession>, StoreError> {
        let token = token.to_string();
        Box::pin(async move { Ok(lock(&self.sessions)?.get(&token).cloned()) })
    }

    fn mark_redeemed(
        &self,
        token: &str,
        booking_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> BoxFuture<'_, bool, StoreError> {
        let token = token.to_string();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let mut sessions = lock(&self.sessions)?;
            match sessions.get_mut(&token) {
                Some(session) if session.state == SessionState::Pending => {
                    session.state = SessionState::Redeemed;
                    session.redeemed_at = Some(redeemed_at);
                    session.booking_id = Some(booking_id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn delete_stale(&self, created_before: DateTime<Utc>) -> BoxFuture<'_, usize, StoreError> {
        Box::pin(async move {
            let mut sessions = lock(&self.sessions)?;
            let before = sessions.len();
            sessions.retain(|_, session| session.created_at >= created_before);
            Ok(before - sessions.len())
        })
    }
}

/// Identity provider used when LINE Login is disabled. Every call fails.
#[derive(Debug, Default)]
pub struct UnconfiguredIdentityProvider;

impl IdentityProvider for UnconfiguredIdentityProvider {
    fn authorization_url(&self, _state: &str) -> Result<String, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    fn exchange_auth_code(&self, _code: &str) -> BoxFuture<'_, ExternalIdentity, IdentityError> {
        Box::pin(async move { Err(IdentityError::NotConfigured) })
    }
}

/// Alert sink that only writes the alert to the log.
#[derive(Debug, Default)]
pub struct LogOnlyAlertSink;

impl AlertSink for LogOnlyAlertSink {
    fn send_operational_alert(&self, alert: OperationalAlert) -> BoxFuture<'_, (), AlertError> {
        Box::pin(async move {
            warn!(kind = ?alert.kind(), "operational alert: {:?}", alert);
            Ok(())
        })
    }
}

/// Notifier that only writes the message to the log.
#[derive(Debug, Default)]
pub struct LogOnlyNotifier;

impl Notifier for LogOnlyNotifier {
    fn push_notification(&self, identity_id: &str, text: &str) -> BoxFuture<'_, (), NotifyError> {
        info!("notification for {} (not delivered): {}", identity_id, text);
        Box::pin(async move { Ok(()) })
    }
}
