//! SQL implementation of the booking session store
//!
//! One row per LINE booking session in `booking_sessions`. Every column is
//! `NOT NULL` text: absent values are stored as `''` and timestamps as
//! fixed-width RFC 3339 UTC strings, which `sqlx::Any` decodes the same way on
//! every backend and which still order correctly as text.

use crate::error::DbError;
use crate::DbClient;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};
use yoyaku_common::models::{BookingSession, ExternalIdentity, SessionState};
use yoyaku_common::services::{BoxFuture, SessionStore};
use yoyaku_common::StoreError;

/// SQL implementation of the session store
#[derive(Debug, Clone)]
pub struct SqlSessionStore {
    /// The database client
    db_client: DbClient,
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRow(format!("bad timestamp {raw:?}: {e}")))
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn query_error(context: &str, e: sqlx::Error) -> DbError {
    error!("{}: {}", context, e);
    DbError::QueryError(e.to_string())
}

fn session_from_row(row: &AnyRow) -> Result<BookingSession, DbError> {
    let token: String = row.try_get("token")?;
    let state_raw: String = row.try_get("state")?;
    let state = SessionState::parse(&state_raw)
        .ok_or_else(|| DbError::CorruptRow(format!("session {token} has state {state_raw:?}")))?;

    let identity_id: String = row.try_get("identity_id")?;
    let display_name: String = row.try_get("display_name")?;
    let identity = non_empty(identity_id).map(|identity_id| ExternalIdentity {
        identity_id,
        display_name,
    });

    let created_at: String = row.try_get("created_at")?;
    let redeemed_at: String = row.try_get("redeemed_at")?;
    let redeemed_at = non_empty(redeemed_at)
        .map(|raw| parse_timestamp(&raw))
        .transpose()?;

    Ok(BookingSession {
        token,
        identity,
        route_ref: non_empty(row.try_get("route_ref")?),
        state,
        created_at: parse_timestamp(&created_at)?,
        redeemed_at,
        booking_id: non_empty(row.try_get("booking_id")?),
    })
}

impl SqlSessionStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Creates the `booking_sessions` table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking session schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS booking_sessions (
                token TEXT PRIMARY KEY NOT NULL,
                identity_id TEXT NOT NULL DEFAULT '',
                display_name TEXT NOT NULL DEFAULT '',
                route_ref TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL,
                created_at TEXT NOT NULL,
                redeemed_at TEXT NOT NULL DEFAULT '',
                booking_id TEXT NOT NULL DEFAULT ''
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Booking session schema initialized successfully");
        Ok(())
    }

    async fn insert(&self, session: BookingSession) -> Result<(), DbError> {
        debug!("Storing booking session {}", session.token);

        let query = r#"
            INSERT INTO booking_sessions
                (token, identity_id, display_name, route_ref, state, created_at, redeemed_at, booking_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;
        let (identity_id, display_name) = match session.identity {
            Some(identity) => (identity.identity_id, identity.display_name),
            None => (String::new(), String::new()),
        };

        sqlx::query(query)
            .bind(session.token)
            .bind(identity_id)
            .bind(display_name)
            .bind(session.route_ref.unwrap_or_default())
            .bind(session.state.as_str())
            .bind(timestamp(session.created_at))
            .bind(session.redeemed_at.map(timestamp).unwrap_or_default())
            .bind(session.booking_id.unwrap_or_default())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to insert booking session", e))?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<BookingSession>, DbError> {
        let query = r#"
            SELECT token, identity_id, display_name, route_ref, state, created_at, redeemed_at, booking_id
            FROM booking_sessions
            WHERE token = $1
        "#;
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to find booking session", e))?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn redeem(
        &self,
        token: &str,
        booking_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        // The state guard makes this a compare-and-set: only one caller can
        // move a given row out of `pending`.
        let query = r#"
            UPDATE booking_sessions
            SET state = $1, redeemed_at = $2, booking_id = $3
            WHERE token = $4 AND state = $5
        "#;
        let result = sqlx::query(query)
            .bind(SessionState::Redeemed.as_str())
            .bind(timestamp(redeemed_at))
            .bind(booking_id)
            .bind(token)
            .bind(SessionState::Pending.as_str())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to redeem booking session", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge(&self, created_before: DateTime<Utc>) -> Result<usize, DbError> {
        let result = sqlx::query("DELETE FROM booking_sessions WHERE created_at < $1")
            .bind(timestamp(created_before))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to delete stale booking sessions", e))?;
        Ok(result.rows_affected() as usize)
    }
}

impl SessionStore for SqlSessionStore {
    fn insert_session(&self, session: BookingSession) -> BoxFuture<'_, (), StoreError> {
        Box::pin(async move { Ok(self.insert(session).await?) })
    }

    fn find_session(&self, token: &str) -> BoxFuture<'_, Option<BookingSession>, StoreError> {
        let token = token.to_string();
        Box::pin(async move { Ok(self.find(&token).await?) })
    }

    fn mark_redeemed(
        &self,
        token: &str,
        booking_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> BoxFuture<'_, bool, StoreError> {
        let token = token.to_string();
        let booking_id = booking_id.to_string();
        Box::pin(async move { Ok(self.redeem(&token, &booking_id, redeemed_at).await?) })
    }

    fn delete_stale(&self, created_before: DateTime<Utc>) -> BoxFuture<'_, usize, StoreError> {
        Box::pin(async move { Ok(self.purge(created_before).await?) })
    }
}
