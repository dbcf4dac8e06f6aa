// --- File: crates/yoyaku_booking/src/routes.rs ---
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::auth::admin_auth_middleware;
use crate::handlers::{
    create_booking_handler, delete_booking_handler, get_availability_handler,
    line_callback_handler, line_login_handler, redeem_session_handler, run_reminders_handler,
    BookingState,
};

/// Creates a router containing all booking routes, relative to `/api`.
///
/// The `/admin` routes are only mounted when `[admin] shared_secret` is set.
pub fn routes(state: Arc<BookingState>) -> Router {
    let mut router = Router::new()
        .route("/availability", get(get_availability_handler))
        .route("/bookings", post(create_booking_handler))
        .route("/bookings/session/{token}", post(redeem_session_handler))
        .route("/line/login", get(line_login_handler))
        .route("/line/callback", get(line_callback_handler));

    if state.config.admin_secret().is_some() {
        router = router.merge(admin_routes(state.clone()));
    } else {
        info!("Admin endpoints disabled: no [admin] shared_secret configured");
    }

    router.with_state(state)
}

fn admin_routes(state: Arc<BookingState>) -> Router<Arc<BookingState>> {
    Router::new()
        .route("/admin/reminders/run", post(run_reminders_handler))
        .route("/admin/bookings/{id}", delete(delete_booking_handler))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
