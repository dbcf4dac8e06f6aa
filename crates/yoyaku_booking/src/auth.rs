// --- File: crates/yoyaku_booking/src/auth.rs ---
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use constant_time_eq::constant_time_eq;
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, error, warn};
use yoyaku_common::error_response;

use crate::handlers::BookingState;

pub const ADMIN_AUTH_HEADER: &str = "X-Admin-Secret";

/// Guards the `/admin` routes with the shared secret from `[admin]`.
pub async fn admin_auth_middleware(
    State(state): State<Arc<BookingState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin_secret() else {
        error!("Admin route reached without a configured shared secret");
        return error_response(503, "Admin endpoints are disabled", Map::new());
    };

    let provided = req
        .headers()
        .get(ADMIN_AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(secret) if constant_time_eq(secret.as_bytes(), expected.as_bytes()) => {
            debug!("Admin request authenticated");
            next.run(req).await
        }
        Some(_) => {
            warn!("Admin request with an invalid secret");
            error_response(401, "Unauthorized: invalid credentials", Map::new())
        }
        None => {
            warn!("Admin request without '{}' header", ADMIN_AUTH_HEADER);
            error_response(
                401,
                format!("Unauthorized: missing {ADMIN_AUTH_HEADER} header"),
                Map::new(),
            )
        }
    }
}
