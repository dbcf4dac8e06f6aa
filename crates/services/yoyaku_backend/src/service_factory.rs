// --- File: crates/services/yoyaku_backend/src/service_factory.rs ---
//! Builds the collaborators the booking surface runs on.
//!
//! A collaborator is used when its feature is compiled in and enabled in
//! configuration; otherwise the process-local fallback from
//! `yoyaku_common::local` takes its place. An enabled collaborator that
//! fails to start is a startup error, never a silent fallback.

use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;
#[allow(unused_imports)] // some are only used by certain features
use tracing::{info, warn};
use yoyaku_booking::Collaborators;
use yoyaku_chatwork::ChatworkAlerter;
use yoyaku_common::features::{is_chatwork_enabled, is_database_enabled, is_gcal_enabled, is_line_enabled};
use yoyaku_common::local::{
    InMemoryEventStore, InMemorySessionStore, LogOnlyAlertSink, LogOnlyNotifier,
    UnconfiguredIdentityProvider,
};
use yoyaku_common::services::{AlertSink, EventStore, IdentityProvider, Notifier, SessionStore};
use yoyaku_config::AppConfig;
use yoyaku_line::LineClient;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Google Calendar store could not start: {0}")]
    Gcal(String),
    #[error("Session database could not start: {0}")]
    Database(String),
    #[error("{0}")]
    Config(String),
}

pub struct YoyakuServiceFactory {
    store: Arc<dyn EventStore>,
    sessions: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    alerts: Arc<dyn AlertSink>,
}

impl YoyakuServiceFactory {
    pub async fn new(config: &AppConfig, time_zone: Tz) -> Result<Self, StartupError> {
        let store = Self::event_store(config, time_zone).await?;
        let sessions = Self::session_store(config).await?;

        let (identity, notifier): (Arc<dyn IdentityProvider>, Arc<dyn Notifier>) =
            match config.line.as_ref().filter(|_| is_line_enabled(config)) {
                Some(line_config) => {
                    info!("LINE Login and Messaging enabled");
                    let client = Arc::new(LineClient::new(line_config.clone()));
                    (client.clone(), client)
                }
                None => {
                    info!("LINE disabled; login unavailable, notifications only logged");
                    (
                        Arc::new(UnconfiguredIdentityProvider),
                        Arc::new(LogOnlyNotifier),
                    )
                }
            };

        let alerts: Arc<dyn AlertSink> =
            match config.chatwork.as_ref().filter(|_| is_chatwork_enabled(config)) {
                Some(chatwork_config) => {
                    info!("ChatWork alerts enabled");
                    Arc::new(ChatworkAlerter::new(chatwork_config.clone(), time_zone))
                }
                None => {
                    info!("ChatWork disabled; operational alerts only logged");
                    Arc::new(LogOnlyAlertSink)
                }
            };

        Ok(Self {
            store,
            sessions,
            identity,
            notifier,
            alerts,
        })
    }

    #[cfg(feature = "gcal")]
    async fn event_store(config: &AppConfig, time_zone: Tz) -> Result<Arc<dyn EventStore>, StartupError> {
        use yoyaku_gcal::{create_calendar_hub, GoogleCalendarStore};

        let Some(gcal_config) = config.gcal.as_ref().filter(|_| is_gcal_enabled(config)) else {
            warn!("Google Calendar disabled; bookings are kept in memory only");
            return Ok(Arc::new(InMemoryEventStore::new()));
        };
        let calendar_id = gcal_config
            .calendar_id
            .clone()
            .ok_or_else(|| StartupError::Config("gcal.calendar_id is missing".to_string()))?;
        let hub = create_calendar_hub(gcal_config)
            .await
            .map_err(|e| StartupError::Gcal(e.to_string()))?;
        info!("Google Calendar store enabled for calendar {}", calendar_id);
        Ok(Arc::new(GoogleCalendarStore::new(
            Arc::new(hub),
            calendar_id,
            time_zone,
        )))
    }

    #[cfg(not(feature = "gcal"))]
    async fn event_store(config: &AppConfig, _time_zone: Tz) -> Result<Arc<dyn EventStore>, StartupError> {
        if is_gcal_enabled(config) {
            warn!("use_gcal is set but the gcal feature is not compiled in");
        }
        warn!("Bookings are kept in memory only");
        Ok(Arc::new(InMemoryEventStore::new()))
    }

    #[cfg(feature = "database")]
    async fn session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, StartupError> {
        use yoyaku_db::{DbClient, SqlSessionStore};

        let Some(db_config) = config.database.as_ref().filter(|_| is_database_enabled(config)) else {
            info!("Session database disabled; sessions are kept in memory");
            return Ok(Arc::new(InMemorySessionStore::new()));
        };
        let client = DbClient::from_config(db_config)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;
        let store = SqlSessionStore::new(client);
        store
            .init_schema()
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;
        info!("Session database enabled");
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "database"))]
    async fn session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, StartupError> {
        if is_database_enabled(config) {
            warn!("use_database is set but the database feature is not compiled in");
        }
        Ok(Arc::new(InMemorySessionStore::new()))
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.store.clone(),
            sessions: self.sessions.clone(),
            identity: self.identity.clone(),
            notifier: self.notifier.clone(),
            alerts: self.alerts.clone(),
        }
    }
}
