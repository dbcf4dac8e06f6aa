// --- File: crates/yoyaku_chatwork/src/alerter.rs ---
use chrono_tz::Tz;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use yoyaku_common::models::OperationalAlert;
use yoyaku_common::services::{AlertSink, BoxFuture};
use yoyaku_common::{AlertError, HTTP_CLIENT};
use yoyaku_config::ChatworkConfig;

use crate::message::render_alert;

const DEFAULT_API_BASE_URL: &str = "https://api.chatwork.com/v2";

#[derive(Error, Debug)]
pub enum ChatworkError {
    #[error("ChatWork API request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("ChatWork API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("Failed to encode request body: {0}")]
    EncodingError(String),
}

impl From<ChatworkError> for AlertError {
    fn from(err: ChatworkError) -> Self {
        match err {
            ChatworkError::ApiError { status, body } => AlertError::Rejected { status, body },
            other => AlertError::Transport(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct MessageForm<'a> {
    body: &'a str,
}

/// Posts operational alerts as messages to one ChatWork room.
#[derive(Clone)]
pub struct ChatworkAlerter {
    config: ChatworkConfig,
    time_zone: Tz,
    http: Client,
}

impl ChatworkAlerter {
    pub fn new(config: ChatworkConfig, time_zone: Tz) -> Self {
        Self::with_client(config, time_zone, HTTP_CLIENT.clone())
    }

    pub fn with_client(config: ChatworkConfig, time_zone: Tz, http: Client) -> Self {
        Self {
            config,
            time_zone,
            http,
        }
    }

    fn messages_url(&self) -> String {
        let base = self
            .config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/');
        format!("{}/rooms/{}/messages", base, self.config.room_id)
    }

    /// Posts raw text to the configured room.
    pub async fn post_message(&self, text: &str) -> Result<(), ChatworkError> {
        let encoded = serde_urlencoded::to_string(MessageForm { body: text })
            .map_err(|e| ChatworkError::EncodingError(e.to_string()))?;

        let response = self
            .http
            .post(self.messages_url())
            .header("X-ChatWorkToken", &self.config.api_token)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encoded)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("ChatWork returned {}: {}", status, body);
            return Err(ChatworkError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl AlertSink for ChatworkAlerter {
    fn send_operational_alert(&self, alert: OperationalAlert) -> BoxFuture<'_, (), AlertError> {
        Box::pin(async move {
            let text = render_alert(&alert, self.time_zone);
            self.post_message(&text).await?;
            info!("Operational alert {:?} posted to ChatWork", alert.kind());
            Ok(())
        })
    }
}
