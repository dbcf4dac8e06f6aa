// --- File: crates/yoyaku_booking/src/booking.rs ---
//! The booking transaction: validate, re-read the day, evaluate, write,
//! then verify what the store actually kept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use yoyaku_availability::{AvailabilityResolver, SlotVerdict, TimeSlot};
use yoyaku_common::models::{
    BookingRecord, BookingStatus, ExternalIdentity, NewBookingRecord, OperationalAlert,
};
use yoyaku_common::services::{AlertSink, EventStore};
use yoyaku_common::StoreError;

use crate::error::BookingError;
use crate::referral::{ReferralRoute, RouteTable};

pub const MAX_CUSTOMER_NAME_CHARS: usize = 100;
pub const MAX_REMARKS_CHARS: usize = 1000;
/// Alert text limit for system errors.
const MAX_ALERT_MESSAGE_CHARS: usize = 500;

// --- Request / Response ---
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingRequest {
    pub customer_name: String,
    /// X/Twitter profile URL. Optional when booking through LINE.
    #[serde(default)]
    pub contact_link: Option<String>,
    /// `YYYY-MM-DD`, business local date.
    pub date: String,
    /// `HH:00`, one of the offered slots.
    pub time: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub call_method: Option<String>,
    /// Referral key, e.g. `personA`.
    #[serde(default)]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingResponse {
    pub success: bool,
    pub booking_id: String,
    pub customer_name: String,
    pub date: String,
    pub time: String,
    pub start_at: String,
    pub end_at: String,
    pub route_tag: Option<String>,
}

/// A request that passed every check that does not need the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub customer_name: String,
    pub contact_link: Option<String>,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub remarks: Option<String>,
    pub call_method: Option<String>,
    pub route: ReferralRoute,
    pub identity_id: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub struct BookingService {
    resolver: Arc<AvailabilityResolver>,
    routes: RouteTable,
    store: Arc<dyn EventStore>,
    alerts: Arc<dyn AlertSink>,
    day_locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl BookingService {
    pub fn new(
        resolver: Arc<AvailabilityResolver>,
        routes: RouteTable,
        store: Arc<dyn EventStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            resolver,
            routes,
            store,
            alerts,
            day_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &AvailabilityResolver {
        &self.resolver
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Field checks. `identity` is the LINE identity of a session booking.
    pub fn validate(
        &self,
        request: &BookingRequest,
        identity: Option<&ExternalIdentity>,
    ) -> Result<ValidatedBooking, BookingError> {
        let customer_name = request.customer_name.trim();
        if customer_name.is_empty() {
            return Err(BookingError::Validation("customer_name is required".to_string()));
        }
        if customer_name.chars().count() > MAX_CUSTOMER_NAME_CHARS {
            return Err(BookingError::Validation(format!(
                "customer_name must be at most {} characters",
                MAX_CUSTOMER_NAME_CHARS
            )));
        }

        let contact_link = trimmed(request.contact_link.as_deref());
        if contact_link.is_none() && identity.is_none() {
            return Err(BookingError::Validation("contact_link is required".to_string()));
        }

        let remarks = trimmed(request.remarks.as_deref());
        if remarks
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_REMARKS_CHARS)
        {
            return Err(BookingError::Validation(format!(
                "remarks must be at most {} characters",
                MAX_REMARKS_CHARS
            )));
        }

        let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d").map_err(|_| {
            BookingError::Validation("Invalid date format (YYYY-MM-DD)".to_string())
        })?;
        let slot = self.resolver.parse_time_slot(&request.time).ok_or_else(|| {
            BookingError::Validation(format!("{} is not an offered time slot", request.time.trim()))
        })?;
        let (start_at, end_at) = self.resolver.slot_window(date, slot).ok_or_else(|| {
            BookingError::Validation(format!("{} {} does not exist locally", date, slot))
        })?;

        let route = self.routes.resolve(request.route.as_deref()).clone();
        if route.requires_line_login && identity.is_none() {
            return Err(BookingError::Validation(format!(
                "route {} requires LINE login",
                route.key
            )));
        }

        Ok(ValidatedBooking {
            customer_name: customer_name.to_string(),
            contact_link,
            date,
            slot,
            start_at,
            end_at,
            remarks,
            call_method: trimmed(request.call_method.as_deref()),
            route,
            identity_id: identity.map(|i| i.identity_id.clone()),
        })
    }

    fn day_lock(&self, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        match self.day_locks.lock() {
            Ok(mut locks) => {
                // Drop locks nobody is holding or waiting on.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
                locks.entry(date).or_default().clone()
            }
            // Poisoned map: fall back to an unshared lock.
            Err(_) => Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Validates and writes one confirmed booking.
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
        identity: Option<&ExternalIdentity>,
    ) -> Result<BookingRecord, BookingError> {
        let booking = self.validate(request, identity)?;

        let lock = self.day_lock(booking.date);
        let _guard = lock.lock().await;

        // Cheap rejections first; no store round trip needed.
        if self.resolver.is_unavailable_day(booking.date) {
            return Err(BookingError::HolidayRejected {
                date: booking.date.to_string(),
            });
        }

        let (window_start, window_end) = self
            .resolver
            .validation_window(booking.date)
            .ok_or_else(|| BookingError::Validation(format!("{} has no local day", booking.date)))?;
        let events = match self.store.query_events(window_start, window_end).await {
            Ok(events) => events,
            Err(e) => return Err(self.upstream_failure("record store", e.to_string()).await),
        };

        match self.resolver.evaluate(booking.date, booking.slot, &events) {
            SlotVerdict::Available => {}
            SlotVerdict::Holiday => {
                return Err(BookingError::HolidayRejected {
                    date: booking.date.to_string(),
                })
            }
            SlotVerdict::FixedRule { rule } => return Err(BookingError::FixedRuleRejected { rule }),
            SlotVerdict::Overlap { event_id } => {
                info!("{} {} overlaps record {}", booking.date, booking.slot, event_id);
                return Err(BookingError::SlotTaken);
            }
            SlotVerdict::AdjacentEvent { event_id, category } => {
                info!(
                    "{} {} blocked by {:?} record {}",
                    booking.date, booking.slot, category, event_id
                );
                return Err(BookingError::SlotBlockedByAdjacentEvent);
            }
            SlotVerdict::NotOffered => {
                return Err(BookingError::Validation(format!(
                    "{} is not an offered time slot",
                    booking.slot
                )))
            }
        }

        let fields = NewBookingRecord {
            customer_name: booking.customer_name.clone(),
            contact_link: booking.contact_link.clone(),
            start_at: booking.start_at,
            end_at: booking.end_at,
            remarks: booking.remarks.clone(),
            call_method: booking.call_method.clone(),
            route_tag: booking.route.tag.clone(),
            external_identity_id: booking.identity_id.clone(),
            status: BookingStatus::Confirmed,
        };
        let record = match self.store.create_event(fields).await {
            Ok(record) => record,
            Err(e) => return Err(self.upstream_failure("record store", e.to_string()).await),
        };
        info!(
            "Booking {} written for {} {} (route {})",
            record.id, booking.date, booking.slot, booking.route.key
        );

        self.verify_written(&record, &booking).await;
        Ok(record)
    }

    /// Read-back checks after a write. Anomalies are alerted, never returned.
    async fn verify_written(&self, record: &BookingRecord, booking: &ValidatedBooking) {
        match self.store.get_event(&record.id).await {
            Ok(stored) => {
                let stored_start = stored.as_ref().and_then(|s| s.start_at);
                if stored_start != Some(booking.start_at) {
                    warn!(
                        "Stored start {:?} differs from requested {} for {}",
                        stored_start, booking.start_at, record.id
                    );
                    self.alert(OperationalAlert::DateMismatch {
                        record_id: record.id.clone(),
                        customer_name: booking.customer_name.clone(),
                        requested_start: booking.start_at,
                        stored_start,
                    })
                    .await;
                }
            }
            Err(e) => warn!("Could not re-read booking {}: {}", record.id, e),
        }

        let Some((day_start, day_end)) = self.resolver.day_window(booking.date) else {
            return;
        };
        match self.store.query_events(day_start, day_end).await {
            Ok(events) => {
                let conflicting = events.iter().find(|other| {
                    other.id != record.id
                        && other.is_confirmed()
                        && other.overlaps(booking.start_at, booking.end_at)
                });
                if let Some(other) = conflicting {
                    warn!("Booking {} overlaps confirmed record {}", record.id, other.id);
                    self.alert(OperationalAlert::OverlapDetected {
                        record_id: record.id.clone(),
                        conflicting_record_id: other.id.clone(),
                        start_at: booking.start_at,
                    })
                    .await;
                }
            }
            Err(e) => warn!("Could not re-read day {} after booking: {}", booking.date, e),
        }
    }

    /// Logs, alerts, and maps an upstream failure.
    pub(crate) async fn upstream_failure(&self, service: &str, detail: String) -> BookingError {
        error!("{} failed: {}", service, detail);
        self.alert(OperationalAlert::SystemError {
            message: truncate(&format!("{service}: {detail}"), MAX_ALERT_MESSAGE_CHARS),
            occurred_at: Utc::now(),
        })
        .await;
        BookingError::upstream(service, detail)
    }

    pub(crate) async fn alert(&self, alert: OperationalAlert) {
        if let Err(e) = self.alerts.send_operational_alert(alert).await {
            warn!("Operational alert not delivered: {}", e);
        }
    }

    /// Operator deletion of a booking. Returns the removed record so the
    /// caller can invalidate what it cached for that week.
    pub async fn delete_booking(&self, record_id: &str) -> Result<BookingRecord, BookingError> {
        let record_id = record_id.trim();
        if record_id.is_empty() {
            return Err(BookingError::Validation("booking id is required".to_string()));
        }
        let record = match self.store.get_event(record_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(BookingError::NotFound(record_id.to_string())),
            Err(e) => return Err(self.upstream_failure("record store", e.to_string()).await),
        };
        match self.store.delete_event(record_id).await {
            Ok(()) => {}
            // Lost a race with another delete.
            Err(StoreError::NotFound(_)) => {
                return Err(BookingError::NotFound(record_id.to_string()))
            }
            Err(e) => return Err(self.upstream_failure("record store", e.to_string()).await),
        }
        info!("Booking {} deleted by operator", record_id);
        Ok(record)
    }

    /// Removes a record written by a losing concurrent redemption.
    pub(crate) async fn discard(&self, record_id: &str) {
        if let Err(e) = self.store.delete_event(record_id).await {
            error!("Failed to remove duplicate booking {}: {}", record_id, e);
            self.alert(OperationalAlert::SystemError {
                message: truncate(
                    &format!("duplicate booking {record_id} could not be removed: {e}"),
                    MAX_ALERT_MESSAGE_CHARS,
                ),
                occurred_at: Utc::now(),
            })
            .await;
        }
    }
}

impl BookingResponse {
    pub fn from_record(record: &BookingRecord, resolver: &AvailabilityResolver) -> Self {
        let time_zone = resolver.time_zone();
        let local_start = record.start_at.map(|s| s.with_timezone(&time_zone));
        Self {
            success: true,
            booking_id: record.id.clone(),
            customer_name: record.customer_name.clone(),
            date: local_start
                .map(|s| s.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            time: local_start
                .map(|s| s.format("%H:%M").to_string())
                .unwrap_or_default(),
            start_at: record.start_at.map(|s| s.to_rfc3339()).unwrap_or_default(),
            end_at: record.end_at.map(|e| e.to_rfc3339()).unwrap_or_default(),
            route_tag: record.route_tag.clone(),
        }
    }
}
