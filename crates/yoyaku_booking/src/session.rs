// --- File: crates/yoyaku_booking/src/session.rs ---
//! LINE booking sessions.
//!
//! A session is opened when the LINE Login callback hands back an identity
//! and is redeemed, at most once, by the booking form submission that
//! carries its token. Sessions older than the TTL are abandoned.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;
use yoyaku_common::models::{BookingRecord, BookingSession, ExternalIdentity, SessionState};
use yoyaku_common::services::{IdentityProvider, Notifier, SessionStore};
use yoyaku_line::{new_login_state, route_from_state};

use crate::booking::{BookingRequest, BookingService};
use crate::error::BookingError;
use crate::messages::confirmation_text;

/// Inputs of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoginCompleted,
    Redeemed,
    Expired,
}

/// The only place session states change. `None` means the event is not
/// allowed in `from`.
pub fn transition(from: SessionState, event: SessionEvent) -> Option<SessionState> {
    match (from, event) {
        (SessionState::NoSession, SessionEvent::LoginCompleted) => Some(SessionState::Pending),
        (SessionState::Pending, SessionEvent::Redeemed) => Some(SessionState::Redeemed),
        (SessionState::Pending, SessionEvent::Expired) => Some(SessionState::Abandoned),
        _ => None,
    }
}

/// Stored state with time-based expiry applied.
pub fn effective_state(session: &BookingSession, now: DateTime<Utc>, ttl: Duration) -> SessionState {
    if session.state == SessionState::Pending && now - session.created_at >= ttl {
        return transition(SessionState::Pending, SessionEvent::Expired)
            .unwrap_or(SessionState::Abandoned);
    }
    session.state
}

/// Result of a completed LINE login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    pub token: String,
    pub display_name: String,
    pub route_ref: Option<String>,
}

/// Token held by an in-process redemption. Released on drop.
struct InFlight<'a> {
    tokens: &'a Mutex<HashSet<String>>,
    token: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(&self.token);
        }
    }
}

pub struct SessionBridge {
    sessions: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    booking: Arc<BookingService>,
    ttl: Duration,
    in_flight: Mutex<HashSet<String>>,
}

impl SessionBridge {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        booking: Arc<BookingService>,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            identity,
            notifier,
            booking,
            ttl,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// LINE authorize URL for a login that remembers `route_ref`.
    pub fn login_url(&self, route_ref: Option<&str>) -> Result<String, BookingError> {
        let state = new_login_state(route_ref);
        Ok(self.identity.authorization_url(&state)?)
    }

    /// Exchanges the callback code and opens a pending session.
    pub async fn open_session(
        &self,
        code: &str,
        state: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OpenedSession, BookingError> {
        let identity = self.identity.exchange_auth_code(code).await.map_err(|e| {
            warn!("LINE code exchange failed: {}", e);
            BookingError::from(e)
        })?;
        let Some(pending) = transition(SessionState::NoSession, SessionEvent::LoginCompleted) else {
            return Err(BookingError::CorruptSession);
        };

        let route_ref = route_from_state(state);
        let session = BookingSession {
            token: Uuid::new_v4().to_string(),
            identity: Some(identity.clone()),
            route_ref: route_ref.clone(),
            state: pending,
            created_at: now,
            redeemed_at: None,
            booking_id: None,
        };
        let token = session.token.clone();
        if let Err(e) = self.sessions.insert_session(session).await {
            return Err(self
                .booking
                .upstream_failure("session store", e.to_string())
                .await);
        }
        info!(
            "Session opened for LINE user {} (route {:?})",
            identity.identity_id, route_ref
        );
        Ok(OpenedSession {
            token,
            display_name: identity.display_name,
            route_ref,
        })
    }

    fn claim(&self, token: &str) -> Result<Option<InFlight<'_>>, BookingError> {
        let Ok(mut tokens) = self.in_flight.lock() else {
            // The store-side compare-and-set still guards redemption.
            return Ok(None);
        };
        if !tokens.insert(token.to_string()) {
            return Err(BookingError::SessionAlreadyUsed);
        }
        Ok(Some(InFlight {
            tokens: &self.in_flight,
            token: token.to_string(),
        }))
    }

    /// Books the slot in `request` for the identity behind `token`.
    pub async fn redeem(
        &self,
        token: &str,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingRecord, BookingError> {
        let _claim = self.claim(token)?;

        let session = match self.sessions.find_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return Err(BookingError::InvalidSession),
            Err(e) => {
                return Err(self
                    .booking
                    .upstream_failure("session store", e.to_string())
                    .await)
            }
        };

        let state = effective_state(&session, now, self.ttl);
        if transition(state, SessionEvent::Redeemed).is_none() {
            return Err(match state {
                SessionState::Redeemed => BookingError::SessionAlreadyUsed,
                _ => BookingError::InvalidSession,
            });
        }
        let identity = session.identity.as_ref().ok_or(BookingError::CorruptSession)?;

        let mut request = request.clone();
        if request.route.is_none() {
            request.route = session.route_ref.clone();
        }
        let record = self.booking.create_booking(&request, Some(identity)).await?;

        match self.sessions.mark_redeemed(token, &record.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Session {} was redeemed concurrently; removing {}", token, record.id);
                self.booking.discard(&record.id).await;
                return Err(BookingError::SessionAlreadyUsed);
            }
            Err(e) => {
                // The session is still pending, so keeping the record would
                // allow a second booking from the same token.
                self.booking.discard(&record.id).await;
                return Err(self
                    .booking
                    .upstream_failure("session store", e.to_string())
                    .await);
            }
        }

        self.send_confirmation(identity, &record).await;
        Ok(record)
    }

    async fn send_confirmation(&self, identity: &ExternalIdentity, record: &BookingRecord) {
        let Some(start_at) = record.start_at else {
            return;
        };
        let text = confirmation_text(
            start_at,
            &record.customer_name,
            record.remarks.as_deref(),
            self.booking.resolver().time_zone(),
        );
        if let Err(e) = self
            .notifier
            .push_notification(&identity.identity_id, &text)
            .await
        {
            warn!(
                "Confirmation for booking {} not delivered: {}",
                record.id, e
            );
        }
    }

    /// Deletes sessions older than the TTL. Returns how many were removed.
    pub async fn reap(&self, now: DateTime<Utc>) -> Result<usize, BookingError> {
        let removed = self
            .sessions
            .delete_stale(now - self.ttl)
            .await
            .map_err(|e| {
                error!("Session reaping failed: {}", e);
                BookingError::from(e)
            })?;
        if removed > 0 {
            info!("Reaped {} stale booking sessions", removed);
        }
        Ok(removed)
    }
}
