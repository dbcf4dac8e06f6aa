// --- File: crates/yoyaku_booking/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::booking::{BookingRequest, BookingResponse};
use crate::handlers::AvailabilityResponse;
use crate::reminder::{ReminderRunReport, SweepKind, SweepReport};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_availability_handler,
        crate::handlers::create_booking_handler,
        crate::handlers::redeem_session_handler,
        crate::handlers::line_login_handler,
        crate::handlers::line_callback_handler,
        crate::handlers::run_reminders_handler,
        crate::handlers::delete_booking_handler,
    ),
    components(
        schemas(
            AvailabilityResponse,
            BookingRequest,
            BookingResponse,
            ReminderRunReport,
            SweepKind,
            SweepReport,
        )
    ),
    tags(
        (name = "Booking", description = "Availability and booking endpoints"),
        (name = "LINE", description = "LINE Login hand-off"),
        (name = "Admin", description = "Operator endpoints")
    )
)]
pub struct BookingApiDoc;
