// File: crates/yoyaku_gcal/src/auth.rs
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use std::path::Path;
use yoyaku_config::GcalConfig;

use crate::service::GcalServiceError;

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, GcalServiceError> {
    let key_path = config
        .key_path
        .as_deref()
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| GcalServiceError::Auth("Missing key_path in GcalConfig".to_string()))?;

    let sa_key = read_service_account_key(Path::new(key_path))
        .await
        .map_err(|e| GcalServiceError::Auth(format!("{key_path}: {e}")))?;

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| GcalServiceError::Auth(e.to_string()))?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| GcalServiceError::Auth(e.to_string()))?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, auth))
}
