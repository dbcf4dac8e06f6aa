// --- File: crates/yoyaku_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

// Include the client module
pub mod client;

/// Builds the standard JSON error body `{"error": {"message", "code", ..extra}}`.
///
/// `extra` entries are merged into the `error` object.
pub fn error_response(status: u16, message: impl Into<String>, extra: Map<String, Value>) -> Response {
    let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut error = Map::new();
    error.insert("message".to_string(), Value::String(message.into()));
    error.insert("code".to_string(), json!(status_code.as_u16()));
    error.extend(extra);

    (status_code, Json(json!({ "error": error }))).into_response()
}
