// --- File: crates/yoyaku_line/src/client.rs ---
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use yoyaku_common::models::ExternalIdentity;
use yoyaku_common::services::{BoxFuture, IdentityProvider, Notifier};
use yoyaku_common::{IdentityError, NotifyError, HTTP_CLIENT};
use yoyaku_config::LineConfig;

const DEFAULT_API_BASE_URL: &str = "https://api.line.me";
const DEFAULT_AUTHORIZE_URL: &str = "https://access.line.me/oauth2/v2.1/authorize";
const LOGIN_SCOPE: &str = "profile openid";

/// LINE rejects text messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_USER_ID_CHARS: usize = 100;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum LineError {
    #[error("LINE API request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("LINE API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("Failed to parse LINE API response: {0}")]
    ParseError(String),
    #[error("Failed to encode request: {0}")]
    EncodingError(String),
}

impl From<LineError> for NotifyError {
    fn from(err: LineError) -> Self {
        match err {
            LineError::ApiError { status, body } => NotifyError::Rejected { status, body },
            other => NotifyError::Transport(other.to_string()),
        }
    }
}

// --- API Payloads ---
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile returned by `GET /v2/profile`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineProfile {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

/// Client for LINE Login and the Messaging API.
#[derive(Clone)]
pub struct LineClient {
    config: LineConfig,
    http: Client,
}

impl LineClient {
    pub fn new(config: LineConfig) -> Self {
        Self::with_client(config, HTTP_CLIENT.clone())
    }

    pub fn with_client(config: LineConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn api_url(&self, path: &str) -> String {
        let base = self
            .config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/');
        format!("{base}{path}")
    }

    /// The frontend the login callback sends the customer back to.
    pub fn frontend_url(&self) -> &str {
        self.config.frontend_url.trim_end_matches('/')
    }

    /// Authorization URL the customer is redirected to for LINE Login.
    pub fn authorize_url(&self, state: &str) -> Result<String, LineError> {
        let base = self
            .config
            .authorize_url
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORIZE_URL);
        let query = serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", self.config.channel_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
            ("scope", LOGIN_SCOPE),
        ])
        .map_err(|e| LineError::EncodingError(e.to_string()))?;
        Ok(format!("{base}?{query}"))
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, LineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("LINE API returned {}: {}", status, body);
        Err(LineError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, LineError> {
        let form = TokenRequest {
            grant_type: "authorization_code",
            code,
            redirect_uri: &self.config.redirect_uri,
            client_id: &self.config.channel_id,
            client_secret: &self.config.channel_secret,
        };
        let response = self
            .http
            .post(self.api_url("/oauth2/v2.1/token"))
            .form(&form)
            .send()
            .await?;
        let token: TokenResponse = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| LineError::ParseError(e.to_string()))?;
        Ok(token.access_token)
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<LineProfile, LineError> {
        let response = self
            .http
            .get(self.api_url("/v2/profile"))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| LineError::ParseError(e.to_string()))
    }

    /// Pushes one text message. Text longer than [`MAX_MESSAGE_CHARS`] is cut.
    pub async fn push_text(&self, user_id: &str, text: &str) -> Result<(), LineError> {
        let body = PushMessage {
            to: truncate_chars(user_id, MAX_USER_ID_CHARS),
            messages: [TextMessage {
                kind: "text",
                text: truncate_chars(text, MAX_MESSAGE_CHARS),
            }],
        };
        let response = self
            .http
            .post(self.api_url("/v2/bot/message/push"))
            .bearer_auth(&self.config.channel_access_token)
            .json(&body)
            .send()
            .await?;
        Self::checked(response).await?;
        debug!("LINE push delivered to {}", user_id);
        Ok(())
    }
}

impl IdentityProvider for LineClient {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        self.authorize_url(state)
            .map_err(|e| IdentityError::InvalidRequest(e.to_string()))
    }

    fn exchange_auth_code(&self, code: &str) -> BoxFuture<'_, ExternalIdentity, IdentityError> {
        let code = code.to_string();
        Box::pin(async move {
            let access_token = self
                .exchange_code(&code)
                .await
                .map_err(|e| IdentityError::ExchangeFailed(e.to_string()))?;
            let profile = self
                .fetch_profile(&access_token)
                .await
                .map_err(|e| IdentityError::ProfileFailed(e.to_string()))?;
            info!("LINE login completed for {}", profile.user_id);
            Ok(ExternalIdentity {
                identity_id: profile.user_id,
                display_name: profile.display_name,
            })
        })
    }
}

impl Notifier for LineClient {
    fn push_notification(&self, identity_id: &str, text: &str) -> BoxFuture<'_, (), NotifyError> {
        let identity_id = identity_id.to_string();
        let text = text.to_string();
        Box::pin(async move { Ok(self.push_text(&identity_id, &text).await?) })
    }
}
