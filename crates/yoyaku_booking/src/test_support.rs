// --- File: crates/yoyaku_booking/src/test_support.rs ---
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use std::sync::Arc;
use yoyaku_availability::AvailabilityResolver;
use yoyaku_common::local::{
    InMemoryEventStore, InMemorySessionStore, RecordingAlertSink, RecordingNotifier,
    StaticIdentityProvider,
};
use yoyaku_common::models::{BookingRecord, BookingStatus, ReminderFlags};
use yoyaku_config::{AppConfig, FixedRuleConfig, ReferralRouteConfig};

use crate::booking::{BookingRequest, BookingService};
use crate::referral::RouteTable;
use crate::reminder::ReminderService;
use crate::session::SessionBridge;

/// Tokyo business rules with one holiday, one fixed rule and two routes.
pub fn config() -> AppConfig {
    let mut config = AppConfig::with_server("127.0.0.1", 0);
    config.calendar.holidays = vec!["2025-07-21".to_string()];
    config.blocking.fixed_rules = vec![FixedRuleConfig {
        name: "wednesday_block".to_string(),
        weekday: Some("Wed".to_string()),
        exclude_weekdays: Vec::new(),
        start_hour: 13,
        end_hour: 14,
        enabled: true,
    }];
    config.routes = vec![
        ReferralRouteConfig {
            key: "normal".to_string(),
            tag: "公認X".to_string(),
            requires_line_login: false,
        },
        ReferralRouteConfig {
            key: "personA".to_string(),
            tag: String::new(),
            requires_line_login: true,
        },
    ];
    config
}

pub fn resolver() -> Arc<AvailabilityResolver> {
    Arc::new(AvailabilityResolver::from_config(&config()).unwrap())
}

/// Tokyo wall-clock time as an instant.
pub fn tokyo(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Tokyo
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn record(id: &str, start: DateTime<Utc>, hours: i64) -> BookingRecord {
    BookingRecord {
        id: id.to_string(),
        customer_name: format!("customer {id}"),
        contact_link: Some("https://x.com/someone".to_string()),
        start_at: Some(start),
        end_at: Some(start + Duration::hours(hours)),
        remarks: None,
        call_method: None,
        route_tag: None,
        external_identity_id: None,
        status: BookingStatus::Confirmed,
        session_token: None,
        reminder_flags: ReminderFlags::default(),
    }
}

pub fn request(date: &str, time: &str) -> BookingRequest {
    BookingRequest {
        customer_name: "山田 太郎".to_string(),
        contact_link: Some("https://x.com/yamada".to_string()),
        date: date.to_string(),
        time: time.to_string(),
        remarks: None,
        call_method: None,
        route: Some("normal".to_string()),
    }
}

pub struct Harness {
    pub store: Arc<InMemoryEventStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub identity: Arc<StaticIdentityProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub alerts: Arc<RecordingAlertSink>,
    pub bookings: Arc<BookingService>,
    pub bridge: Arc<SessionBridge>,
    pub reminders: ReminderService,
}

pub fn harness(records: Vec<BookingRecord>) -> Harness {
    let config = config();
    let resolver = resolver();
    let store = Arc::new(InMemoryEventStore::with_records(records));
    let sessions = Arc::new(InMemorySessionStore::new());
    let identity = Arc::new(StaticIdentityProvider::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let alerts = Arc::new(RecordingAlertSink::new());
    let bookings = Arc::new(BookingService::new(
        resolver.clone(),
        RouteTable::from_config(&config.routes),
        store.clone(),
        alerts.clone(),
    ));
    let bridge = Arc::new(SessionBridge::new(
        sessions.clone(),
        identity.clone(),
        notifier.clone(),
        bookings.clone(),
        Duration::minutes(config.session.ttl_minutes),
    ));
    let reminders = ReminderService::new(
        resolver,
        store.clone(),
        notifier.clone(),
        alerts.clone(),
        config.reminder.clone(),
    );
    Harness {
        store,
        sessions,
        identity,
        notifier,
        alerts,
        bookings,
        bridge,
        reminders,
    }
}
