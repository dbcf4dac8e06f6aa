// --- File: crates/yoyaku_gcal/src/mapping.rs ---
//! Conversion between Google Calendar events and canonical booking records.
//!
//! Everything the calendar cannot hold natively lives in
//! `extendedProperties.private` under the keys below.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use google_calendar3::api::{Event, EventDateTime, EventExtendedProperties};
use std::collections::HashMap;
use yoyaku_common::models::{
    BookingRecord, BookingStatus, NewBookingRecord, RecordPatch, ReminderFlags,
};

pub const KEY_CONTACT_LINK: &str = "xLink";
pub const KEY_REMARKS: &str = "remarks";
pub const KEY_ROUTE: &str = "route";
pub const KEY_CALL_METHOD: &str = "callMethod";
pub const KEY_LINE_USER_ID: &str = "lineUserId";
pub const KEY_BOOKING_STATUS: &str = "bookingStatus";
pub const KEY_SESSION_ID: &str = "sessionId";
pub const KEY_DAY_BEFORE_SENT: &str = "dayBeforeReminderSent";
pub const KEY_FIFTEEN_MINUTE_SENT: &str = "fifteenMinReminderSent";

const STATUS_PROVISIONAL: &str = "provisional";
const STATUS_CONFIRMED: &str = "confirmed";
// Written by older revisions of the booking form. The confirmed
// counterpart, "予約完了", falls through to the default.
const LEGACY_STATUS_PROVISIONAL: &str = "仮登録";

pub fn is_cancelled(event: &Event) -> bool {
    event.status.as_deref() == Some("cancelled")
}

/// Reads a store status string. Unknown or missing values count as confirmed,
/// so hand-entered calendar events still block their slot.
pub fn parse_status(raw: Option<&str>) -> BookingStatus {
    match raw.map(str::trim) {
        Some(STATUS_PROVISIONAL) | Some(LEGACY_STATUS_PROVISIONAL) => BookingStatus::Provisional,
        _ => BookingStatus::Confirmed,
    }
}

fn status_value(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Provisional => STATUS_PROVISIONAL,
        BookingStatus::Confirmed => STATUS_CONFIRMED,
    }
}

fn local_midnight(date: NaiveDate, time_zone: Tz) -> Option<DateTime<Utc>> {
    time_zone
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Timed events use `dateTime`; all-day events start at local midnight of
/// their `date` in the business time zone.
fn instant_of(when: Option<&EventDateTime>, time_zone: Tz) -> Option<DateTime<Utc>> {
    let when = when?;
    when.date_time
        .or_else(|| when.date.and_then(|date| local_midnight(date, time_zone)))
}

fn non_empty(properties: &HashMap<String, String>, key: &str) -> Option<String> {
    properties
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn flag(properties: &HashMap<String, String>, key: &str) -> bool {
    properties
        .get(key)
        .map_or(false, |value| value.trim().eq_ignore_ascii_case("true"))
}

/// Maps a calendar event into a booking record. `None` for events without an id.
pub fn event_to_record(event: &Event, time_zone: Tz) -> Option<BookingRecord> {
    let id = event.id.clone()?;
    let empty = HashMap::new();
    let properties = event
        .extended_properties
        .as_ref()
        .and_then(|extended| extended.private.as_ref())
        .unwrap_or(&empty);

    Some(BookingRecord {
        id,
        customer_name: event.summary.clone().unwrap_or_default(),
        contact_link: non_empty(properties, KEY_CONTACT_LINK),
        start_at: instant_of(event.start.as_ref(), time_zone),
        end_at: instant_of(event.end.as_ref(), time_zone),
        remarks: non_empty(properties, KEY_REMARKS),
        call_method: non_empty(properties, KEY_CALL_METHOD),
        route_tag: non_empty(properties, KEY_ROUTE),
        external_identity_id: non_empty(properties, KEY_LINE_USER_ID),
        status: parse_status(properties.get(KEY_BOOKING_STATUS).map(String::as_str)),
        session_token: non_empty(properties, KEY_SESSION_ID),
        reminder_flags: ReminderFlags {
            day_before_sent: flag(properties, KEY_DAY_BEFORE_SENT),
            fifteen_minute_sent: flag(properties, KEY_FIFTEEN_MINUTE_SENT),
        },
    })
}

fn timed(instant: DateTime<Utc>, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date_time: Some(instant),
        time_zone: Some(time_zone.to_string()),
        ..Default::default()
    }
}

/// Builds the event inserted for a new record.
pub fn new_record_to_event(fields: &NewBookingRecord, time_zone: &str) -> Event {
    let mut properties = HashMap::new();
    let optional = [
        (KEY_CONTACT_LINK, &fields.contact_link),
        (KEY_REMARKS, &fields.remarks),
        (KEY_ROUTE, &fields.route_tag),
        (KEY_CALL_METHOD, &fields.call_method),
        (KEY_LINE_USER_ID, &fields.external_identity_id),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            properties.insert(key.to_string(), value.to_string());
        }
    }
    properties.insert(
        KEY_BOOKING_STATUS.to_string(),
        status_value(fields.status).to_string(),
    );
    properties.insert(KEY_DAY_BEFORE_SENT.to_string(), "false".to_string());
    properties.insert(KEY_FIFTEEN_MINUTE_SENT.to_string(), "false".to_string());

    Event {
        summary: Some(fields.customer_name.clone()),
        start: Some(timed(fields.start_at, time_zone)),
        end: Some(timed(fields.end_at, time_zone)),
        extended_properties: Some(EventExtendedProperties {
            private: Some(properties),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds a patch body carrying only the raised flags. Private properties
/// are merged key by key by the calendar, so nothing else is touched.
pub fn patch_to_event(patch: &RecordPatch) -> Event {
    let mut properties = HashMap::new();
    if patch.mark_day_before_sent {
        properties.insert(KEY_DAY_BEFORE_SENT.to_string(), "true".to_string());
    }
    if patch.mark_fifteen_minute_sent {
        properties.insert(KEY_FIFTEEN_MINUTE_SENT.to_string(), "true".to_string());
    }
    Event {
        extended_properties: Some(EventExtendedProperties {
            private: Some(properties),
            ..Default::default()
        }),
        ..Default::default()
    }
}
