// --- File: crates/yoyaku_chatwork/src/message.rs ---
//! Room message bodies for operational alerts.
//!
//! Field values are cut to fixed lengths before they are interpolated.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use yoyaku_common::models::OperationalAlert;

const DATE_MAX_CHARS: usize = 50;
const TIME_MAX_CHARS: usize = 20;
const NAME_MAX_CHARS: usize = 100;
const ERROR_MAX_CHARS: usize = 500;
const TIMESTAMP_MAX_CHARS: usize = 50;
const ID_MAX_CHARS: usize = 100;

fn cut(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn local_date(instant: DateTime<Utc>, time_zone: Tz) -> String {
    instant.with_timezone(&time_zone).format("%Y-%m-%d").to_string()
}

fn local_time(instant: DateTime<Utc>, time_zone: Tz) -> String {
    instant.with_timezone(&time_zone).format("%H:%M").to_string()
}

/// Renders the ChatWork message text for an alert, with times in `time_zone`.
pub fn render_alert(alert: &OperationalAlert, time_zone: Tz) -> String {
    match alert {
        OperationalAlert::DateMismatch {
            customer_name,
            requested_start,
            stored_start,
            ..
        } => {
            let selected = cut(&local_date(*requested_start, time_zone), DATE_MAX_CHARS);
            let registered = stored_start
                .map(|start| local_date(start, time_zone))
                .unwrap_or_else(|| "不明".to_string());
            format!(
                "[toall]\n[緊急] 予約システムアラート\n\n日付ズレが発生しました！\n\n選択日: {}\n登録日: {}\n時間: {}\nお客様: {}\n\nシステム設定を至急確認してください。",
                selected,
                cut(&registered, DATE_MAX_CHARS),
                cut(&local_time(*requested_start, time_zone), TIME_MAX_CHARS),
                cut(customer_name, NAME_MAX_CHARS),
            )
        }
        OperationalAlert::OverlapDetected {
            record_id,
            conflicting_record_id,
            start_at,
        } => {
            let slot = start_at.with_timezone(&time_zone).format("%Y-%m-%d %H:%M");
            format!(
                "[toall]\n[緊急] 予約システムアラート\n\n重複予約が検出されました！\n\n日時: {}\n予約ID: {}\n重複先ID: {}\n\nカレンダーを至急確認してください。",
                cut(&slot.to_string(), DATE_MAX_CHARS),
                cut(record_id, ID_MAX_CHARS),
                cut(conflicting_record_id, ID_MAX_CHARS),
            )
        }
        OperationalAlert::SystemError {
            message,
            occurred_at,
        } => {
            let timestamp = occurred_at
                .with_timezone(&time_zone)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            format!(
                "[toall]\n[緊急] 予約システムエラー\n\nシステム異常が検出されました。\n\nエラー内容: {}\n発生時刻: {}\n\n至急システムを確認してください。",
                cut(message, ERROR_MAX_CHARS),
                cut(&timestamp, TIMESTAMP_MAX_CHARS),
            )
        }
    }
}
