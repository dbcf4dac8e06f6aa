#[cfg(test)]
mod tests {
    use crate::holidays::{parse_weekday, HolidayCalendar};
    use crate::AvailabilityError;
    use chrono::{NaiveDate, Weekday};
    use yoyaku_config::{BusinessConfig, CalendarConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        let config = CalendarConfig {
            holidays: vec!["2025-11-03".to_string(), "2025-11-24".to_string()],
            closure_days: vec!["2025-12-29".to_string()],
        };
        HolidayCalendar::from_config(&config, &BusinessConfig::default()).unwrap()
    }

    #[test]
    fn test_weekends_are_unavailable() {
        let calendar = calendar();
        assert!(calendar.is_unavailable_day(date(2025, 6, 7))); // Saturday
        assert!(calendar.is_unavailable_day(date(2025, 6, 8))); // Sunday
        assert!(!calendar.is_unavailable_day(date(2025, 6, 9))); // Monday
    }

    #[test]
    fn test_holidays_and_closures() {
        let calendar = calendar();
        assert!(calendar.is_holiday(date(2025, 11, 3)));
        assert!(calendar.is_unavailable_day(date(2025, 11, 3)));
        assert!(calendar.is_closure_day(date(2025, 12, 29)));
        assert!(calendar.is_unavailable_day(date(2025, 12, 29)));
        assert!(!calendar.is_holiday(date(2025, 12, 29)));
        assert!(!calendar.is_unavailable_day(date(2025, 12, 26)));
    }

    #[test]
    fn test_new_dates_need_no_code_change() {
        let mut config = CalendarConfig::default();
        config.closure_days.push("2026-08-14".to_string());
        let calendar = HolidayCalendar::from_config(&config, &BusinessConfig::default()).unwrap();
        assert!(calendar.is_unavailable_day(date(2026, 8, 14)));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let config = CalendarConfig {
            holidays: vec!["2025/11/03".to_string()],
            closure_days: Vec::new(),
        };
        let err = HolidayCalendar::from_config(&config, &BusinessConfig::default()).unwrap_err();
        assert_eq!(err, AvailabilityError::InvalidDate("2025/11/03".to_string()));
    }

    #[test]
    fn test_weekday_names_and_numbers() {
        assert_eq!(parse_weekday("Tue").unwrap(), Weekday::Tue);
        assert_eq!(parse_weekday("wednesday").unwrap(), Weekday::Wed);
        assert_eq!(parse_weekday("0").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("2").unwrap(), Weekday::Tue);
        assert!(parse_weekday("7").is_err());
        assert!(parse_weekday("Funday").is_err());
    }
}
