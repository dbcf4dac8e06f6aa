// --- File: crates/yoyaku_booking/src/handlers.rs ---
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Redirect},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use yoyaku_availability::{AvailabilityError, AvailabilityResolver, DayAvailability};
use yoyaku_common::models::BookingRecord;
use yoyaku_common::services::{AlertSink, EventStore, IdentityProvider, Notifier, SessionStore};
use yoyaku_config::AppConfig;

use crate::availability::AvailabilityService;
use crate::booking::{BookingRequest, BookingResponse, BookingService};
use crate::cache::{week_key, AvailabilityCache};
use crate::error::BookingError;
use crate::referral::RouteTable;
use crate::reminder::{ReminderRunReport, ReminderService, SweepKind};
use crate::session::SessionBridge;

/// External collaborators the booking surface is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn EventStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub alerts: Arc<dyn AlertSink>,
}

// Define shared state needed by booking handlers
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub availability: Arc<AvailabilityService>,
    pub bookings: Arc<BookingService>,
    pub sessions: Arc<SessionBridge>,
    pub reminders: Arc<ReminderService>,
}

impl BookingState {
    pub fn from_config(
        config: Arc<AppConfig>,
        collaborators: Collaborators,
    ) -> Result<Self, AvailabilityError> {
        let resolver = Arc::new(AvailabilityResolver::from_config(&config)?);
        let cache = Arc::new(AvailabilityCache::new(Duration::minutes(
            config.cache.ttl_minutes,
        )));
        let bookings = Arc::new(BookingService::new(
            resolver.clone(),
            RouteTable::from_config(&config.routes),
            collaborators.store.clone(),
            collaborators.alerts.clone(),
        ));
        let sessions = Arc::new(SessionBridge::new(
            collaborators.sessions,
            collaborators.identity,
            collaborators.notifier.clone(),
            bookings.clone(),
            Duration::minutes(config.session.ttl_minutes),
        ));
        let reminders = Arc::new(ReminderService::new(
            resolver.clone(),
            collaborators.store.clone(),
            collaborators.notifier,
            collaborators.alerts,
            config.reminder.clone(),
        ));
        Ok(Self {
            availability: Arc::new(AvailabilityService::new(resolver, collaborators.store, cache)),
            config,
            bookings,
            sessions,
            reminders,
        })
    }

    /// Keeps the cache honest after a write attempt.
    fn settle_cache(&self, result: &Result<BookingRecord, BookingError>) {
        let cache = self.availability.cache();
        match result {
            Ok(record) => {
                if let Some(start_at) = record.start_at {
                    let date = self.bookings.resolver().local_date(start_at);
                    cache.invalidate(week_key(date));
                }
            }
            Err(e) if e.is_slot_conflict() => cache.invalidate_all(),
            Err(_) => {}
        }
    }

    fn frontend_url(&self) -> String {
        self.config
            .line
            .as_ref()
            .map(|line| line.frontend_url.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }
}

// --- Query / Response types ---
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`
    pub from: String,
    /// `YYYY-MM-DD`, inclusive
    pub to: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailabilityResponse {
    pub from: String,
    pub to: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub days: Vec<DayAvailability>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct LineLoginQuery {
    /// Referral key carried through the login.
    #[serde(rename = "ref")]
    pub route_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct LineCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ReminderRunQuery {
    #[serde(default)]
    pub sweep: SweepKind,
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::Validation(format!("Invalid {} format (YYYY-MM-DD)", field)))
}

fn redirect_with(base: &str, params: &[(&str, &str)]) -> Redirect {
    // Cannot fail for string pairs.
    let query = serde_urlencoded::to_string(params).unwrap_or_default();
    Redirect::to(&format!("{base}/?{query}"))
}

/// Handler for the calendar grid: slot statuses for every day in a range.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Per-day slot statuses", body = AvailabilityResponse),
        (status = 400, description = "Invalid or too long date range"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Booking"
))]
pub async fn get_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, BookingError> {
    let from = parse_date(&query.from, "from")?;
    let to = parse_date(&query.to, "to")?;
    let days = state.availability.range(from, to, Utc::now()).await?;
    Ok(Json(AvailabilityResponse {
        from: from.to_string(),
        to: to.to_string(),
        days,
    }))
}

/// Handler for anonymous bookings (form fill with a contact link).
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/bookings",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking written", body = BookingResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Holiday or fixed rule"),
        (status = 409, description = "Slot taken or blocked by a nearby appointment"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Booking"
))]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    let result = state.bookings.create_booking(&request, None).await;
    state.settle_cache(&result);
    let record = result?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_record(&record, state.bookings.resolver())),
    ))
}

/// Handler for bookings that come back from LINE Login with a session token.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/bookings/session/{token}",
    params(("token" = String, Path, description = "Session token from the login callback")),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking written", body = BookingResponse),
        (status = 403, description = "Session invalid, expired or already used"),
        (status = 409, description = "Slot taken or blocked by a nearby appointment"),
        (status = 500, description = "Session has no identity")
    ),
    tag = "Booking"
))]
pub async fn redeem_session_handler(
    State(state): State<Arc<BookingState>>,
    Path(token): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    let result = state.sessions.redeem(&token, &request, Utc::now()).await;
    state.settle_cache(&result);
    let record = result?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_record(&record, state.bookings.resolver())),
    ))
}

/// Starts LINE Login.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/line/login",
    params(LineLoginQuery),
    responses(
        (status = 303, description = "Redirect to the LINE authorize page"),
        (status = 503, description = "LINE login disabled")
    ),
    tag = "LINE"
))]
pub async fn line_login_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<LineLoginQuery>,
) -> Result<Redirect, BookingError> {
    let url = state.sessions.login_url(query.route_ref.as_deref())?;
    Ok(Redirect::to(&url))
}

/// LINE Login callback. Always redirects back to the frontend.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/line/callback",
    params(LineCallbackQuery),
    responses(
        (status = 303, description = "Redirect to the booking form with a session or an error")
    ),
    tag = "LINE"
))]
pub async fn line_callback_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<LineCallbackQuery>,
) -> Redirect {
    let frontend = state.frontend_url();

    if let Some(error) = query.error.as_deref() {
        let message = query.error_description.as_deref().unwrap_or(error);
        warn!("LINE login returned an error: {}", message);
        return redirect_with(&frontend, &[("line_error", message)]);
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return redirect_with(&frontend, &[("line_error", "missing authorization code")]);
    };

    match state
        .sessions
        .open_session(code, query.state.as_deref(), Utc::now())
        .await
    {
        Ok(opened) => {
            info!("Redirecting LINE user back with a booking session");
            let mut params = vec![
                ("session_id", opened.token.as_str()),
                ("line_name", opened.display_name.as_str()),
            ];
            if let Some(route_ref) = opened.route_ref.as_deref() {
                params.push(("ref", route_ref));
            }
            redirect_with(&frontend, &params)
        }
        Err(e) => redirect_with(&frontend, &[("line_error", e.user_message())]),
    }
}

/// Runs a reminder sweep on demand.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/reminders/run",
    params(ReminderRunQuery),
    responses(
        (status = 200, description = "Sweep report", body = ReminderRunReport),
        (status = 401, description = "Missing or invalid admin secret"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Admin"
))]
pub async fn run_reminders_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<ReminderRunQuery>,
) -> Result<Json<ReminderRunReport>, BookingError> {
    let report = state.reminders.run(query.sweep, Utc::now()).await?;
    Ok(Json(report))
}

/// Operator deletion of a booking.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/admin/bookings/{id}",
    params(("id" = String, Path, description = "Booking record id")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 401, description = "Missing or invalid admin secret"),
        (status = 404, description = "No such booking"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Admin"
))]
pub async fn delete_booking_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, BookingError> {
    let record = state.bookings.delete_booking(&id).await?;
    state.settle_cache(&Ok(record));
    Ok(StatusCode::NO_CONTENT)
}
