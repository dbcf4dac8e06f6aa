// File: services/yoyaku_backend/src/main.rs
use axum::{routing::get, Router};
use http::{HeaderValue, Method};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use yoyaku_availability::AvailabilityResolver;
use yoyaku_booking::routes as booking_routes;
use yoyaku_booking::BookingState;
use yoyaku_common::logging;
use yoyaku_config::{load_config, AppConfig};

mod scheduler;
mod service_factory;

use service_factory::YoyakuServiceFactory;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if config.server.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Arc::new(load_config()?);
    let _log_guard = logging::init(&config.logging);

    let time_zone = AvailabilityResolver::from_config(&config)?.time_zone();
    let factory = YoyakuServiceFactory::new(&config, time_zone).await?;
    let state = Arc::new(BookingState::from_config(
        config.clone(),
        factory.collaborators(),
    )?);

    if config.reminder.enabled {
        scheduler::spawn_reminder_loop(
            state.reminders.clone(),
            config.reminder.sweep_interval_secs,
        );
    } else {
        info!("Reminder sweeps disabled");
    }
    scheduler::spawn_session_reaper(state.sessions.clone(), config.session.reap_interval_secs);

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Yoyaku booking API!" }))
        .merge(booking_routes::routes(state));

    #[allow(unused_mut)] // for the features it needs to be mutable
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        use yoyaku_booking::doc::BookingApiDoc;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Yoyaku API",
                version = "0.1.0",
                description = "Appointment booking API",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
