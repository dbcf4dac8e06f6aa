// --- File: crates/yoyaku_common/src/models.rs ---

//! Canonical booking models.
//!
//! Store adapters map their native shapes into these types on read; nothing
//! past the adapter boundary inspects store-native data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length assumed for an event that has a start but no end.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Session placeholder. Never counts toward availability.
    Provisional,
    Confirmed,
}

/// Idempotency markers for the reminder sweeps. Only ever move from `false` to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReminderFlags {
    pub day_before_sent: bool,
    pub fifteen_minute_sent: bool,
}

/// One appointment, as held by the external record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    pub customer_name: String,
    pub contact_link: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    /// Category tag (e.g. in-person, shooting); drives derived blocking.
    pub call_method: Option<String>,
    pub route_tag: Option<String>,
    pub external_identity_id: Option<String>,
    pub status: BookingStatus,
    pub session_token: Option<String>,
    #[serde(default)]
    pub reminder_flags: ReminderFlags,
}

impl BookingRecord {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// `[start, end)` of the record, with a missing end read as
    /// `start + DEFAULT_EVENT_MINUTES`. `None` when there is no start.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start_at?;
        let end = self
            .end_at
            .unwrap_or_else(|| start + Duration::minutes(DEFAULT_EVENT_MINUTES));
        Some((start, end))
    }

    /// Half-open overlap with `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.interval() {
            Some((event_start, event_end)) => event_start < end && event_end > start,
            None => false,
        }
    }
}

/// Fields for a record that does not exist yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBookingRecord {
    pub customer_name: String,
    pub contact_link: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub remarks: Option<String>,
    pub call_method: Option<String>,
    pub route_tag: Option<String>,
    pub external_identity_id: Option<String>,
    pub status: BookingStatus,
}

impl NewBookingRecord {
    pub fn into_record(self, id: String) -> BookingRecord {
        BookingRecord {
            id,
            customer_name: self.customer_name,
            contact_link: self.contact_link,
            start_at: Some(self.start_at),
            end_at: Some(self.end_at),
            remarks: self.remarks,
            call_method: self.call_method,
            route_tag: self.route_tag,
            external_identity_id: self.external_identity_id,
            status: self.status,
            session_token: None,
            reminder_flags: ReminderFlags::default(),
        }
    }
}

/// Partial update of a stored record.
///
/// Reminder flags can only be raised; there is no way to express a reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub mark_day_before_sent: bool,
    pub mark_fifteen_minute_sent: bool,
}

impl RecordPatch {
    pub fn day_before_sent() -> Self {
        Self {
            mark_day_before_sent: true,
            ..Self::default()
        }
    }

    pub fn fifteen_minute_sent() -> Self {
        Self {
            mark_fifteen_minute_sent: true,
            ..Self::default()
        }
    }

    pub fn apply_to(&self, record: &mut BookingRecord) {
        if self.mark_day_before_sent {
            record.reminder_flags.day_before_sent = true;
        }
        if self.mark_fifteen_minute_sent {
            record.reminder_flags.fifteen_minute_sent = true;
        }
    }
}

/// An identity returned by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub identity_id: String,
    pub display_name: String,
}

/// Lifecycle of a LINE-originated booking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NoSession,
    Pending,
    Redeemed,
    Abandoned,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::NoSession => "no_session",
            SessionState::Pending => "pending",
            SessionState::Redeemed => "redeemed",
            SessionState::Abandoned => "abandoned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "no_session" => Some(SessionState::NoSession),
            "pending" => Some(SessionState::Pending),
            "redeemed" => Some(SessionState::Redeemed),
            "abandoned" => Some(SessionState::Abandoned),
            _ => None,
        }
    }
}

/// Entry of the dedicated session store, keyed by its single-use token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSession {
    pub token: String,
    pub identity: Option<ExternalIdentity>,
    /// Referral key carried through the login round trip.
    pub route_ref: Option<String>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ConflictDetected,
    SystemError,
}

/// Out-of-band operational alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationalAlert {
    /// The store reports a different start than the one that was written.
    DateMismatch {
        record_id: String,
        customer_name: String,
        requested_start: DateTime<Utc>,
        stored_start: Option<DateTime<Utc>>,
    },
    /// Another confirmed record overlaps a record that was just written.
    OverlapDetected {
        record_id: String,
        conflicting_record_id: String,
        start_at: DateTime<Utc>,
    },
    SystemError {
        message: String,
        occurred_at: DateTime<Utc>,
    },
}

impl OperationalAlert {
    pub fn kind(&self) -> AlertKind {
        match self {
            OperationalAlert::DateMismatch { .. } | OperationalAlert::OverlapDetected { .. } => {
                AlertKind::ConflictDetected
            }
            OperationalAlert::SystemError { .. } => AlertKind::SystemError,
        }
    }
}
