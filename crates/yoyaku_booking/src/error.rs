// --- File: crates/yoyaku_booking/src/error.rs ---
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use thiserror::Error;
use yoyaku_common::{error_response, HttpStatusCode, IdentityError, StoreError};

/// Every failure the booking surface reports to a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{date} is not a business day")]
    HolidayRejected { date: String },

    #[error("Slot is blocked by rule {rule}")]
    FixedRuleRejected { rule: String },

    #[error("Slot is already booked")]
    SlotTaken,

    #[error("Slot is blocked by a nearby appointment")]
    SlotBlockedByAdjacentEvent,

    #[error("Booking session is invalid or expired")]
    InvalidSession,

    #[error("Booking session has already been used")]
    SessionAlreadyUsed,

    #[error("Booking session has no identity attached")]
    CorruptSession,

    /// Detail is logged, never shown.
    #[error("{service} is unavailable")]
    Upstream { service: String, detail: String },

    #[error("LINE login failed: {0}")]
    AuthExchangeFailed(String),

    #[error("Booking {0} not found")]
    NotFound(String),
}

/// Coarse grouping used by the frontend to choose a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    AvailabilityConflict,
    Session,
    NotFound,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::AvailabilityConflict => "availability_conflict",
            ErrorKind::Session => "session",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Upstream => "upstream",
        }
    }
}

impl BookingError {
    pub fn upstream(service: &str, detail: impl Into<String>) -> Self {
        BookingError::Upstream {
            service: service.to_string(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::HolidayRejected { .. }
            | BookingError::FixedRuleRejected { .. }
            | BookingError::SlotTaken
            | BookingError::SlotBlockedByAdjacentEvent => ErrorKind::AvailabilityConflict,
            BookingError::InvalidSession
            | BookingError::SessionAlreadyUsed
            | BookingError::CorruptSession
            | BookingError::AuthExchangeFailed(_) => ErrorKind::Session,
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::Upstream { .. } => ErrorKind::Upstream,
        }
    }

    /// `true` when the slot turned out to be taken between read and write,
    /// which means any cached availability is stale.
    pub fn is_slot_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::SlotTaken | BookingError::SlotBlockedByAdjacentEvent
        )
    }

    /// Text shown to the customer.
    pub fn user_message(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "入力内容をご確認ください。",
            BookingError::HolidayRejected { .. } => "選択された日は休業日のため予約できません。",
            BookingError::FixedRuleRejected { .. } => "選択された時間は予約を受け付けていません。",
            BookingError::SlotTaken => {
                "選択された時間は既に予約が入っています。別の時間をお選びください。"
            }
            BookingError::SlotBlockedByAdjacentEvent => {
                "選択された時間は前後の予定のため予約できません。別の時間をお選びください。"
            }
            BookingError::InvalidSession => {
                "予約の有効期限が切れました。もう一度LINEでログインしてください。"
            }
            BookingError::SessionAlreadyUsed => "この予約リンクは既に使用されています。",
            BookingError::CorruptSession | BookingError::AuthExchangeFailed(_) => {
                "LINEログインに失敗しました。もう一度お試しください。"
            }
            BookingError::NotFound(_) => "指定された予約は見つかりません。",
            BookingError::Upstream { .. } => {
                "ただいま予約を受け付けられません。時間をおいて再度お試しください。"
            }
        }
    }
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 400,
            BookingError::HolidayRejected { .. } => 403,
            BookingError::FixedRuleRejected { .. } => 403,
            BookingError::SlotTaken => 409,
            BookingError::SlotBlockedByAdjacentEvent => 409,
            BookingError::InvalidSession => 403,
            BookingError::SessionAlreadyUsed => 403,
            BookingError::CorruptSession => 500,
            BookingError::Upstream { .. } => 503,
            BookingError::AuthExchangeFailed(_) => 502,
            BookingError::NotFound(_) => 404,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::upstream("record store", err.to_string())
    }
}

impl From<IdentityError> for BookingError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => BookingError::upstream("LINE login", err.to_string()),
            other => BookingError::AuthExchangeFailed(other.to_string()),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let mut extra = Map::new();
        extra.insert("kind".to_string(), Value::from(self.kind().as_str()));
        extra.insert("user_message".to_string(), Value::from(self.user_message()));
        error_response(self.status_code(), self.to_string(), extra)
    }
}
