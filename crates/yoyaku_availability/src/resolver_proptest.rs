#[cfg(test)]
mod tests {
    use crate::resolver::{AvailabilityResolver, DayStatus, SlotStatus, FEW_SLOTS_THRESHOLD};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Tokyo;
    use proptest::prelude::*;
    use yoyaku_common::models::{BookingRecord, BookingStatus, ReminderFlags};
    use yoyaku_config::AppConfig;

    fn resolver() -> AvailabilityResolver {
        let mut config = AppConfig::with_server("127.0.0.1", 8086);
        config.calendar.holidays = vec!["2025-06-11".to_string()];
        AvailabilityResolver::from_config(&config).unwrap()
    }

    // 2025-06-02 is a Monday.
    fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap() + Duration::days(offset as i64)
    }

    fn local(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Tokyo
            .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
            .unwrap()
            .with_timezone(&Utc)
    }

    // (day offset, start hour, duration hours, category, confirmed)
    fn arb_event() -> impl Strategy<Value = (u32, u32, u32, u8, bool)> {
        (0u32..14, 8u32..22, 1u32..3, 0u8..3, any::<bool>())
    }

    fn build(events: &[(u32, u32, u32, u8, bool)]) -> Vec<BookingRecord> {
        events
            .iter()
            .enumerate()
            .map(|(i, &(offset, hour, hours, category, confirmed))| {
                let start = local(day(offset), hour);
                BookingRecord {
                    id: format!("evt-{i}"),
                    customer_name: "お客様".to_string(),
                    contact_link: None,
                    start_at: Some(start),
                    end_at: Some(start + Duration::hours(hours as i64)),
                    remarks: None,
                    call_method: match category {
                        0 => Some("対面".to_string()),
                        1 => Some("撮影".to_string()),
                        _ => Some("オンライン".to_string()),
                    },
                    route_tag: None,
                    external_identity_id: None,
                    status: if confirmed {
                        BookingStatus::Confirmed
                    } else {
                        BookingStatus::Provisional
                    },
                    session_token: None,
                    reminder_flags: ReminderFlags::default(),
                }
            })
            .collect()
    }

    fn statuses(resolver: &AvailabilityResolver, date: NaiveDate, events: &[BookingRecord]) -> Vec<SlotStatus> {
        resolver
            .time_slots()
            .into_iter()
            .map(|slot| resolver.get_status(date, slot, events))
            .collect()
    }

    proptest! {
        #[test]
        fn test_provisional_records_never_change_status(
            raw in prop::collection::vec(arb_event(), 0..8),
            offset in 0u32..14,
        ) {
            let resolver = resolver();
            let events = build(&raw);
            let confirmed: Vec<BookingRecord> =
                events.iter().filter(|e| e.is_confirmed()).cloned().collect();
            let date = day(offset);
            prop_assert_eq!(statuses(&resolver, date, &events), statuses(&resolver, date, &confirmed));
        }

        #[test]
        fn test_unavailable_days_are_holiday_for_every_slot(
            raw in prop::collection::vec(arb_event(), 0..8),
            offset in 0u32..14,
        ) {
            let resolver = resolver();
            let events = build(&raw);
            let date = day(offset);
            let all_holiday = statuses(&resolver, date, &events)
                .iter()
                .all(|status| *status == SlotStatus::Holiday);
            prop_assert_eq!(resolver.is_unavailable_day(date), all_holiday);
        }

        #[test]
        fn test_more_events_never_open_a_slot(
            raw in prop::collection::vec(arb_event(), 1..8),
            offset in 0u32..14,
        ) {
            let resolver = resolver();
            let events = build(&raw);
            let fewer = &events[..events.len() - 1];
            let date = day(offset);
            let with_all = statuses(&resolver, date, &events);
            let with_fewer = statuses(&resolver, date, fewer);
            for (more, less) in with_all.iter().zip(with_fewer.iter()) {
                if *less != SlotStatus::Available {
                    prop_assert_eq!(more, less);
                }
            }
        }

        #[test]
        fn test_day_status_matches_open_slot_count(
            raw in prop::collection::vec(arb_event(), 0..8),
            offset in 0u32..14,
        ) {
            let resolver = resolver();
            let events = build(&raw);
            let date = day(offset);
            let open = statuses(&resolver, date, &events)
                .iter()
                .filter(|status| **status == SlotStatus::Available)
                .count();
            let expected = if resolver.is_unavailable_day(date) {
                DayStatus::Holiday
            } else if open == 0 {
                DayStatus::Full
            } else if open <= FEW_SLOTS_THRESHOLD {
                DayStatus::Few
            } else {
                DayStatus::Available
            };
            prop_assert_eq!(resolver.get_day_status(date, &events), expected);
        }

        #[test]
        fn test_overlapping_confirmed_event_books_slot(
            offset in 0u32..14,
            hour in 12u32..21,
        ) {
            let resolver = resolver();
            let date = day(offset);
            let events = build(&[(offset, hour, 1, 2, true)]);
            let slot = resolver.parse_time_slot(&format!("{hour:02}:00")).unwrap();
            let status = resolver.get_status(date, slot, &events);
            if resolver.is_unavailable_day(date) {
                prop_assert_eq!(status, SlotStatus::Holiday);
            } else {
                prop_assert_eq!(status, SlotStatus::Booked);
            }
        }
    }
}
