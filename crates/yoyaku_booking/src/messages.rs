// --- File: crates/yoyaku_booking/src/messages.rs ---
//! Customer-facing LINE texts.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

pub const IMMINENT_REMINDER_TEXT: &str = "【ご予約15分前のお知らせ】\n\n本日はよろしくお願いいたします！\nお時間になりましたらご入室をお願いいたします！\n\n（※担当者の状況により、直接のご連絡と前後して本通知が送られている場合がございます。ご容赦くださいますと幸いです。）";

/// Pushed once a session booking is written.
pub fn confirmation_text(
    start_at: DateTime<Utc>,
    customer_name: &str,
    remarks: Option<&str>,
    time_zone: Tz,
) -> String {
    let local = start_at.with_timezone(&time_zone);
    let remarks_line = match remarks.map(str::trim).filter(|r| !r.is_empty()) {
        Some(remarks) => format!("備考: {remarks}\n"),
        None => String::new(),
    };
    format!(
        "【予約完了】\n\n日付: {}年{}月{}日 {}時\nお名前: {}\n{}\n予約が完了しました！\n担当者から折り返しご連絡いたします。",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        customer_name,
        remarks_line
    )
}

pub fn day_before_text(start_at: DateTime<Utc>, time_zone: Tz) -> String {
    let local = start_at.with_timezone(&time_zone);
    format!(
        "【ご予約日前日のお知らせ】\n\n{}年{}月{}日 {}\n\n明日はよろしくお願いいたします！",
        local.year(),
        local.month(),
        local.day(),
        local.format("%H:%M")
    )
}

pub fn imminent_text() -> &'static str {
    IMMINENT_REMINDER_TEXT
}
