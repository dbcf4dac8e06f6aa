#[cfg(test)]
mod tests {
    use crate::mapping::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Tokyo;
    use google_calendar3::api::{Event, EventDateTime, EventExtendedProperties};
    use std::collections::HashMap;
    use yoyaku_common::models::{BookingStatus, NewBookingRecord, RecordPatch};

    fn event_with(properties: &[(&str, &str)]) -> Event {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap();
        Event {
            id: Some("evt-1".to_string()),
            summary: Some("山田太郎".to_string()),
            start: Some(EventDateTime {
                date_time: Some(start),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some(start + chrono::Duration::hours(1)),
                ..Default::default()
            }),
            extended_properties: Some(EventExtendedProperties {
                private: Some(
                    properties
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<HashMap<_, _>>(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_event_maps_every_field() {
        let event = event_with(&[
            (KEY_CONTACT_LINK, "https://x.com/yamada"),
            (KEY_REMARKS, "初回です"),
            (KEY_ROUTE, "公認X"),
            (KEY_CALL_METHOD, "対面"),
            (KEY_LINE_USER_ID, "U123"),
            (KEY_BOOKING_STATUS, "confirmed"),
            (KEY_DAY_BEFORE_SENT, "true"),
            (KEY_FIFTEEN_MINUTE_SENT, "false"),
        ]);
        let record = event_to_record(&event, Tokyo).unwrap();

        assert_eq!(record.id, "evt-1");
        assert_eq!(record.customer_name, "山田太郎");
        assert_eq!(record.contact_link.as_deref(), Some("https://x.com/yamada"));
        assert_eq!(record.remarks.as_deref(), Some("初回です"));
        assert_eq!(record.route_tag.as_deref(), Some("公認X"));
        assert_eq!(record.call_method.as_deref(), Some("対面"));
        assert_eq!(record.external_identity_id.as_deref(), Some("U123"));
        assert_eq!(record.status, BookingStatus::Confirmed);
        assert!(record.reminder_flags.day_before_sent);
        assert!(!record.reminder_flags.fifteen_minute_sent);
        assert_eq!(record.start_at, Some(Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap()));
    }

    #[test]
    fn test_hand_entered_event_is_confirmed() {
        let mut event = event_with(&[]);
        event.extended_properties = None;
        let record = event_to_record(&event, Tokyo).unwrap();
        assert_eq!(record.status, BookingStatus::Confirmed);
        assert_eq!(record.contact_link, None);
        assert!(!record.reminder_flags.day_before_sent);
    }

    #[test]
    fn test_legacy_status_strings() {
        assert_eq!(parse_status(Some("仮登録")), BookingStatus::Provisional);
        assert_eq!(parse_status(Some("予約完了")), BookingStatus::Confirmed);
        assert_eq!(parse_status(Some("provisional")), BookingStatus::Provisional);
        assert_eq!(parse_status(None), BookingStatus::Confirmed);
    }

    #[test]
    fn test_event_without_id_is_dropped() {
        let mut event = event_with(&[]);
        event.id = None;
        assert!(event_to_record(&event, Tokyo).is_none());
    }

    #[test]
    fn test_all_day_event_starts_at_local_midnight() {
        let mut event = event_with(&[]);
        event.start = Some(EventDateTime {
            date: NaiveDate::from_ymd_opt(2025, 6, 2),
            ..Default::default()
        });
        event.end = Some(EventDateTime {
            date: NaiveDate::from_ymd_opt(2025, 6, 3),
            ..Default::default()
        });
        let record = event_to_record(&event, Tokyo).unwrap();
        let midnight = Tokyo.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(record.start_at, Some(midnight));
        assert_eq!(record.end_at, Some(midnight + chrono::Duration::days(1)));
    }

    #[test]
    fn test_new_record_writes_status_and_cleared_flags() {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap();
        let fields = NewBookingRecord {
            customer_name: "佐藤".to_string(),
            contact_link: Some("https://x.com/sato".to_string()),
            start_at: start,
            end_at: start + chrono::Duration::hours(1),
            remarks: None,
            call_method: Some(String::new()),
            route_tag: Some("まゆ紹介".to_string()),
            external_identity_id: None,
            status: BookingStatus::Confirmed,
        };
        let event = new_record_to_event(&fields, "Asia/Tokyo");
        let properties = event
            .extended_properties
            .and_then(|extended| extended.private)
            .unwrap();

        assert_eq!(event.summary.as_deref(), Some("佐藤"));
        assert_eq!(
            event.start.and_then(|s| s.time_zone).as_deref(),
            Some("Asia/Tokyo")
        );
        assert_eq!(properties.get(KEY_BOOKING_STATUS).map(String::as_str), Some("confirmed"));
        assert_eq!(properties.get(KEY_ROUTE).map(String::as_str), Some("まゆ紹介"));
        assert_eq!(properties.get(KEY_DAY_BEFORE_SENT).map(String::as_str), Some("false"));
        assert!(!properties.contains_key(KEY_REMARKS));
        assert!(!properties.contains_key(KEY_CALL_METHOD));
    }

    #[test]
    fn test_patch_only_carries_raised_flags() {
        let event = patch_to_event(&RecordPatch::fifteen_minute_sent());
        let properties = event
            .extended_properties
            .and_then(|extended| extended.private)
            .unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(
            properties.get(KEY_FIFTEEN_MINUTE_SENT).map(String::as_str),
            Some("true")
        );
        assert!(event.summary.is_none());
        assert!(event.start.is_none());
    }

    #[test]
    fn test_cancelled_detection() {
        let mut event = event_with(&[]);
        assert!(!is_cancelled(&event));
        event.status = Some("cancelled".to_string());
        assert!(is_cancelled(&event));
    }
}
