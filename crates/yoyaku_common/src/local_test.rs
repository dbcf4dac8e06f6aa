use crate::local::{InMemoryEventStore, InMemorySessionStore, RecordingNotifier};
use crate::models::{
    BookingSession, BookingStatus, ExternalIdentity, NewBookingRecord, RecordPatch, SessionState,
};
use crate::services::{EventStore, Notifier, SessionStore};
use crate::StoreError;
use chrono::{Duration, TimeZone, Utc};

fn fields(hour: u32) -> NewBookingRecord {
    let start = Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap();
    NewBookingRecord {
        customer_name: "Test Customer".to_string(),
        contact_link: Some("https://x.com/test".to_string()),
        start_at: start,
        end_at: start + Duration::hours(1),
        remarks: None,
        call_method: None,
        route_tag: Some("公認X".to_string()),
        external_identity_id: None,
        status: BookingStatus::Confirmed,
    }
}

fn session(token: &str, minutes_ago: i64) -> BookingSession {
    BookingSession {
        token: token.to_string(),
        identity: Some(ExternalIdentity {
            identity_id: "U123".to_string(),
            display_name: "Taro".to_string(),
        }),
        route_ref: Some("personA".to_string()),
        state: SessionState::Pending,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        redeemed_at: None,
        booking_id: None,
    }
}

#[tokio::test]
async fn test_create_then_get_round_trips() {
    let store = InMemoryEventStore::new();
    let created = store.create_event(fields(3)).await.unwrap();
    assert!(created.id.starts_with("mem-event-"));

    let fetched = store.get_event(&created.id).await.unwrap();
    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn test_query_is_half_open() {
    let store = InMemoryEventStore::new();
    let created = store.create_event(fields(3)).await.unwrap();
    let start = created.start_at.unwrap();

    let touching_after = store
        .query_events(start + Duration::hours(1), start + Duration::hours(2))
        .await
        .unwrap();
    assert!(touching_after.is_empty());

    let covering = store
        .query_events(start - Duration::hours(1), start + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(covering.len(), 1);
}

#[tokio::test]
async fn test_update_raises_flags_and_delete_removes() {
    let store = InMemoryEventStore::new();
    let created = store.create_event(fields(4)).await.unwrap();

    let updated = store
        .update_event(&created.id, RecordPatch::day_before_sent())
        .await
        .unwrap();
    assert!(updated.reminder_flags.day_before_sent);
    assert!(!updated.reminder_flags.fifteen_minute_sent);

    store.delete_event(&created.id).await.unwrap();
    assert_eq!(store.get_event(&created.id).await.unwrap(), None);
    assert_eq!(
        store.delete_event(&created.id).await,
        Err(StoreError::NotFound(created.id.clone()))
    );
}

#[tokio::test]
async fn test_mark_redeemed_is_compare_and_set() {
    let store = InMemorySessionStore::new();
    store.insert_session(session("tok-1", 0)).await.unwrap();

    let now = Utc::now();
    assert!(store.mark_redeemed("tok-1", "evt-1", now).await.unwrap());
    assert!(!store.mark_redeemed("tok-1", "evt-2", now).await.unwrap());
    assert!(!store.mark_redeemed("missing", "evt-3", now).await.unwrap());

    let stored = store.find_session("tok-1").await.unwrap().unwrap();
    assert_eq!(stored.state, SessionState::Redeemed);
    assert_eq!(stored.booking_id.as_deref(), Some("evt-1"));
}

#[tokio::test]
async fn test_delete_stale_keeps_recent_sessions() {
    let store = InMemorySessionStore::new();
    store.insert_session(session("old", 180)).await.unwrap();
    store.insert_session(session("fresh", 1)).await.unwrap();

    let removed = store
        .delete_stale(Utc::now() - Duration::minutes(60))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(store.find_session("old").await.unwrap().is_none());
    assert!(store.find_session("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn test_recording_notifier_rejects_registered_failures() {
    let notifier = RecordingNotifier::new();
    notifier.fail_for("U-broken");

    assert!(notifier.push_notification("U-ok", "hello").await.is_ok());
    assert!(notifier.push_notification("U-broken", "hello").await.is_err());
    assert_eq!(
        notifier.sent(),
        vec![("U-ok".to_string(), "hello".to_string())]
    );
}

#[tokio::test]
async fn test_static_identity_provider_only_accepts_known_codes() {
    use crate::local::{StaticIdentityProvider, UnconfiguredIdentityProvider};
    use crate::services::IdentityProvider;
    use crate::IdentityError;

    let provider = StaticIdentityProvider::new();
    provider.accept("code-1", "U777", "Hanako");

    let identity = provider.exchange_auth_code("code-1").await.unwrap();
    assert_eq!(identity.identity_id, "U777");
    assert!(matches!(
        provider.exchange_auth_code("code-2").await,
        Err(IdentityError::ExchangeFailed(_))
    ));

    let disabled = UnconfiguredIdentityProvider;
    assert_eq!(
        disabled.authorization_url("state"),
        Err(IdentityError::NotConfigured)
    );
}
