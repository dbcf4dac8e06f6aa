#[cfg(test)]
mod tests {
    use crate::message::render_alert;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Asia::Tokyo;
    use yoyaku_common::models::OperationalAlert;

    #[test]
    fn test_date_mismatch_uses_local_dates() {
        // 2025-06-02 15:30 UTC is 2025-06-03 00:30 in Tokyo.
        let alert = OperationalAlert::DateMismatch {
            record_id: "evt-1".to_string(),
            customer_name: "山田".to_string(),
            requested_start: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
            stored_start: Some(Utc.with_ymd_and_hms(2025, 6, 2, 15, 30, 0).unwrap()),
        };
        let text = render_alert(&alert, Tokyo);

        assert!(text.starts_with("[toall]\n[緊急] 予約システムアラート"));
        assert!(text.contains("選択日: 2025-06-02\n"));
        assert!(text.contains("登録日: 2025-06-03\n"));
        assert!(text.contains("時間: 14:00\n"));
        assert!(text.contains("お客様: 山田\n"));
    }

    #[test]
    fn test_missing_stored_start_is_unknown() {
        let alert = OperationalAlert::DateMismatch {
            record_id: "evt-1".to_string(),
            customer_name: "山田".to_string(),
            requested_start: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
            stored_start: None,
        };
        assert!(render_alert(&alert, Tokyo).contains("登録日: 不明\n"));
    }

    #[test]
    fn test_long_fields_are_cut() {
        let alert = OperationalAlert::DateMismatch {
            record_id: "evt-1".to_string(),
            customer_name: "名".repeat(150),
            requested_start: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
            stored_start: None,
        };
        let text = render_alert(&alert, Tokyo);
        let expected = format!("お客様: {}\n", "名".repeat(100));
        assert!(text.contains(&expected));
        assert!(!text.contains(&"名".repeat(101)));

        let error = OperationalAlert::SystemError {
            message: "x".repeat(800),
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
        };
        let text = render_alert(&error, Tokyo);
        assert!(text.contains(&format!("エラー内容: {}\n", "x".repeat(500))));
        assert!(text.contains("発生時刻: 2025-06-02 14:00:00\n"));
    }

    #[test]
    fn test_overlap_names_both_records() {
        let alert = OperationalAlert::OverlapDetected {
            record_id: "evt-new".to_string(),
            conflicting_record_id: "evt-old".to_string(),
            start_at: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
        };
        let text = render_alert(&alert, Tokyo);
        assert!(text.contains("重複予約が検出されました"));
        assert!(text.contains("日時: 2025-06-02 14:00\n"));
        assert!(text.contains("予約ID: evt-new\n"));
        assert!(text.contains("重複先ID: evt-old\n"));
    }
}
