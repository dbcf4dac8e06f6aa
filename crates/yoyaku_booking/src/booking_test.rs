use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use yoyaku_common::local::{InMemoryEventStore, RecordingAlertSink};
use yoyaku_common::models::{
    BookingRecord, BookingStatus, ExternalIdentity, NewBookingRecord, OperationalAlert,
    RecordPatch,
};
use yoyaku_common::services::{BoxFuture, EventStore};
use yoyaku_common::StoreError;

use crate::booking::BookingService;
use crate::error::BookingError;
use crate::referral::RouteTable;
use crate::test_support::{config, harness, record, request, resolver, tokyo};

fn service_over(store: Arc<dyn EventStore>, alerts: Arc<RecordingAlertSink>) -> BookingService {
    BookingService::new(
        resolver(),
        RouteTable::from_config(&config().routes),
        store,
        alerts,
    )
}

/// Stores every record one day later than requested but echoes the
/// requested start on create, like a store with a date conversion bug.
struct ShiftingStore {
    inner: InMemoryEventStore,
}

impl EventStore for ShiftingStore {
    fn query_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError> {
        self.inner.query_events(range_start, range_end)
    }

    fn get_event(&self, id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError> {
        self.inner.get_event(id)
    }

    fn create_event(&self, fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError> {
        Box::pin(async move {
            let requested = (fields.start_at, fields.end_at);
            let mut shifted = fields;
            shifted.start_at += Duration::days(1);
            shifted.end_at += Duration::days(1);
            let mut echoed = self.inner.create_event(shifted).await?;
            echoed.start_at = Some(requested.0);
            echoed.end_at = Some(requested.1);
            Ok(echoed)
        })
    }

    fn update_event(&self, id: &str, patch: RecordPatch) -> BoxFuture<'_, BookingRecord, StoreError> {
        self.inner.update_event(id, patch)
    }

    fn delete_event(&self, id: &str) -> BoxFuture<'_, (), StoreError> {
        self.inner.delete_event(id)
    }
}

/// Returns nothing for the first query, then the real contents: a
/// concurrent writer in another process that the pre-write read missed.
struct StaleFirstReadStore {
    inner: InMemoryEventStore,
    first_read_done: AtomicBool,
}

impl EventStore for StaleFirstReadStore {
    fn query_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError> {
        if !self.first_read_done.swap(true, Ordering::SeqCst) {
            return Box::pin(async move { Ok(Vec::new()) });
        }
        self.inner.query_events(range_start, range_end)
    }

    fn get_event(&self, id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError> {
        self.inner.get_event(id)
    }

    fn create_event(&self, fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError> {
        self.inner.create_event(fields)
    }

    fn update_event(&self, id: &str, patch: RecordPatch) -> BoxFuture<'_, BookingRecord, StoreError> {
        self.inner.update_event(id, patch)
    }

    fn delete_event(&self, id: &str) -> BoxFuture<'_, (), StoreError> {
        self.inner.delete_event(id)
    }
}

struct DownStore;

impl EventStore for DownStore {
    fn query_events(
        &self,
        _range_start: DateTime<Utc>,
        _range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError> {
        Box::pin(async move { Err(StoreError::Unavailable("calendar timed out".to_string())) })
    }

    fn get_event(&self, _id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError> {
        Box::pin(async move { Err(StoreError::Unavailable("calendar timed out".to_string())) })
    }

    fn create_event(&self, _fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError> {
        Box::pin(async move { Err(StoreError::Unavailable("calendar timed out".to_string())) })
    }

    fn update_event(&self, _id: &str, _patch: RecordPatch) -> BoxFuture<'_, BookingRecord, StoreError> {
        Box::pin(async move { Err(StoreError::Unavailable("calendar timed out".to_string())) })
    }

    fn delete_event(&self, _id: &str) -> BoxFuture<'_, (), StoreError> {
        Box::pin(async move { Err(StoreError::Unavailable("calendar timed out".to_string())) })
    }
}

#[tokio::test]
async fn test_books_free_slot_with_route_tag() {
    let h = harness(Vec::new());
    let record = h
        .bookings
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .unwrap();

    assert_eq!(record.start_at, Some(tokyo(2025, 6, 5, 14, 0)));
    assert_eq!(record.end_at, Some(tokyo(2025, 6, 5, 15, 0)));
    assert_eq!(record.route_tag.as_deref(), Some("公認X"));
    assert_eq!(record.status, BookingStatus::Confirmed);
    assert_eq!(record.contact_link.as_deref(), Some("https://x.com/yamada"));
    assert_eq!(h.store.snapshot().len(), 1);
    assert!(h.alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_unknown_route_falls_back_to_normal() {
    let h = harness(Vec::new());
    let mut req = request("2025-06-05", "14:00");
    req.route = Some("somebody".to_string());
    let record = h.bookings.create_booking(&req, None).await.unwrap();
    assert_eq!(record.route_tag.as_deref(), Some("公認X"));
}

#[tokio::test]
async fn test_rejects_holidays_and_closed_weekdays() {
    let h = harness(Vec::new());
    let err = h
        .bookings
        .create_booking(&request("2025-07-21", "14:00"), None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::HolidayRejected {
            date: "2025-07-21".to_string()
        }
    );

    // Saturday
    let err = h
        .bookings
        .create_booking(&request("2025-06-07", "14:00"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::HolidayRejected { .. }));
    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn test_rejects_fixed_rule_slot() {
    let h = harness(Vec::new());
    let err = h
        .bookings
        .create_booking(&request("2025-06-04", "13:00"), None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::FixedRuleRejected {
            rule: "wednesday_block".to_string()
        }
    );
}

#[tokio::test]
async fn test_rejects_direct_overlap() {
    let h = harness(vec![record("existing", tokyo(2025, 6, 5, 14, 0), 1)]);
    let err = h
        .bookings
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::SlotTaken);
    assert_eq!(h.store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_in_person_event_blocks_three_hours_either_side() {
    let mut in_person = record("in-person", tokyo(2025, 6, 5, 12, 0), 1);
    in_person.call_method = Some("対面".to_string());
    let h = harness(vec![in_person]);

    let err = h
        .bookings
        .create_booking(&request("2025-06-05", "15:00"), None)
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::SlotBlockedByAdjacentEvent);

    // The buffer ends at 16:00 exactly.
    assert!(h
        .bookings
        .create_booking(&request("2025-06-05", "16:00"), None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_provisional_records_do_not_block() {
    let mut provisional = record("provisional", tokyo(2025, 6, 5, 14, 0), 1);
    provisional.status = BookingStatus::Provisional;
    let h = harness(vec![provisional]);

    assert!(h
        .bookings
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_validation_failures() {
    let h = harness(Vec::new());

    let mut req = request("2025-06-05", "14:00");
    req.customer_name = "   ".to_string();
    assert!(matches!(
        h.bookings.create_booking(&req, None).await,
        Err(BookingError::Validation(_))
    ));

    let mut req = request("2025-06-05", "14:00");
    req.contact_link = None;
    assert!(matches!(
        h.bookings.create_booking(&req, None).await,
        Err(BookingError::Validation(_))
    ));

    for time in ["14:30", "22:00", "11:00", "later"] {
        let req = request("2025-06-05", time);
        assert!(
            matches!(
                h.bookings.create_booking(&req, None).await,
                Err(BookingError::Validation(_))
            ),
            "time {time} should be rejected"
        );
    }

    let req = request("2025/06/05", "14:00");
    assert!(matches!(
        h.bookings.create_booking(&req, None).await,
        Err(BookingError::Validation(_))
    ));

    let mut req = request("2025-06-05", "14:00");
    req.remarks = Some("あ".repeat(1001));
    assert!(matches!(
        h.bookings.create_booking(&req, None).await,
        Err(BookingError::Validation(_))
    ));

    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn test_line_only_route_needs_identity() {
    let h = harness(Vec::new());
    let mut req = request("2025-06-05", "14:00");
    req.route = Some("personA".to_string());
    req.contact_link = None;

    assert!(matches!(
        h.bookings.create_booking(&req, None).await,
        Err(BookingError::Validation(_))
    ));

    let identity = ExternalIdentity {
        identity_id: "U1".to_string(),
        display_name: "Hanako".to_string(),
    };
    let record = h.bookings.create_booking(&req, Some(&identity)).await.unwrap();
    assert_eq!(record.external_identity_id.as_deref(), Some("U1"));
    assert_eq!(record.route_tag, None);
    assert_eq!(record.contact_link, None);
}

#[tokio::test]
async fn test_concurrent_same_slot_has_one_winner() {
    let h = harness(Vec::new());
    let req = request("2025-06-05", "14:00");

    let (first, second) = tokio::join!(
        h.bookings.create_booking(&req, None),
        h.bookings.create_booking(&req, None)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(BookingError::SlotTaken))));
    assert_eq!(h.store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_date_mismatch_is_alerted_but_booking_succeeds() {
    let alerts = Arc::new(RecordingAlertSink::new());
    let service = service_over(
        Arc::new(ShiftingStore {
            inner: InMemoryEventStore::new(),
        }),
        alerts.clone(),
    );

    let record = service
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .unwrap();

    let alerts = alerts.alerts();
    assert_eq!(alerts.len(), 1);
    match &alerts[0] {
        OperationalAlert::DateMismatch {
            record_id,
            requested_start,
            stored_start,
            ..
        } => {
            assert_eq!(record_id, &record.id);
            assert_eq!(*requested_start, tokyo(2025, 6, 5, 14, 0));
            assert_eq!(*stored_start, Some(tokyo(2025, 6, 6, 14, 0)));
        }
        other => panic!("unexpected alert {other:?}"),
    }
}

#[tokio::test]
async fn test_missed_concurrent_write_raises_overlap_alert() {
    let alerts = Arc::new(RecordingAlertSink::new());
    let service = service_over(
        Arc::new(StaleFirstReadStore {
            inner: InMemoryEventStore::with_records(vec![record(
                "other-process",
                tokyo(2025, 6, 5, 14, 0),
                1,
            )]),
            first_read_done: AtomicBool::new(false),
        }),
        alerts.clone(),
    );

    let record = service
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .unwrap();

    assert_eq!(
        alerts.alerts(),
        vec![OperationalAlert::OverlapDetected {
            record_id: record.id.clone(),
            conflicting_record_id: "other-process".to_string(),
            start_at: tokyo(2025, 6, 5, 14, 0),
        }]
    );
}

#[tokio::test]
async fn test_store_outage_is_upstream_error_with_alert() {
    let alerts = Arc::new(RecordingAlertSink::new());
    let service = service_over(Arc::new(DownStore), alerts.clone());

    let err = service
        .create_booking(&request("2025-06-05", "14:00"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Upstream { .. }));
    assert_eq!(err.to_string(), "record store is unavailable");

    let alerts = alerts.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(matches!(
        &alerts[0],
        OperationalAlert::SystemError { message, .. } if message.contains("calendar timed out")
    ));
}

#[tokio::test]
async fn test_holiday_is_rejected_without_touching_the_store() {
    let alerts = Arc::new(RecordingAlertSink::new());
    let service = service_over(Arc::new(DownStore), alerts.clone());

    let err = service
        .create_booking(&request("2025-06-07", "14:00"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::HolidayRejected { .. }));
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_operator_delete_removes_record_once() {
    let start = tokyo(2025, 6, 5, 14, 0);
    let h = harness(vec![record("evt-1", start, 1)]);

    let removed = h.bookings.delete_booking("evt-1").await.unwrap();
    assert_eq!(removed.start_at, Some(start));
    assert!(h.store.snapshot().is_empty());

    let err = h.bookings.delete_booking("evt-1").await.unwrap_err();
    assert_eq!(err, BookingError::NotFound("evt-1".to_string()));

    let err = h.bookings.delete_booking("  ").await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_operator_delete_during_outage_is_upstream_error() {
    let alerts = Arc::new(RecordingAlertSink::new());
    let service = service_over(Arc::new(DownStore), alerts.clone());

    let err = service.delete_booking("evt-1").await.unwrap_err();
    assert!(matches!(err, BookingError::Upstream { .. }));
    assert_eq!(alerts.alerts().len(), 1);
}
