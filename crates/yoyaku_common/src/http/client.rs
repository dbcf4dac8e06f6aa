// --- File: crates/yoyaku_common/src/http/client.rs ---
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A static HTTP client shared by the LINE and ChatWork adapters.
/// Every request made through it is bounded by [`DEFAULT_TIMEOUT_SECS`].
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|err| {
            tracing::error!("falling back to default HTTP client: {}", err);
            Client::new()
        })
});
