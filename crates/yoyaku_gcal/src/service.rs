// --- File: crates/yoyaku_gcal/src/service.rs ---
//! Google Calendar implementation of the booking record store.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use google_calendar3::api::Event;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use yoyaku_common::models::{BookingRecord, NewBookingRecord, RecordPatch};
use yoyaku_common::services::{BoxFuture, EventStore};
use yoyaku_common::StoreError;

use crate::auth::HubType;
use crate::mapping::{event_to_record, is_cancelled, new_record_to_event, patch_to_event};

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Authentication setup failed: {0}")]
    Auth(String),
    #[error("Event not found: {0}")]
    NotFound(String),
    #[error("Malformed event: {0}")]
    Malformed(String),
}

impl From<GcalServiceError> for StoreError {
    fn from(err: GcalServiceError) -> Self {
        match err {
            GcalServiceError::NotFound(id) => StoreError::NotFound(id),
            GcalServiceError::Malformed(message) => StoreError::Malformed(message),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

fn is_not_found(err: &google_calendar3::Error) -> bool {
    match err {
        google_calendar3::Error::BadRequest(body) => {
            body.pointer("/error/code").and_then(Value::as_u64) == Some(404)
        }
        other => other.to_string().contains("404"),
    }
}

fn api_error(err: google_calendar3::Error, id: &str) -> GcalServiceError {
    if is_not_found(&err) {
        GcalServiceError::NotFound(id.to_string())
    } else {
        GcalServiceError::ApiError(err)
    }
}

/// Booking records stored as events of one Google calendar.
pub struct GoogleCalendarStore {
    calendar_hub: Arc<HubType>,
    calendar_id: String,
    time_zone: Tz,
}

impl GoogleCalendarStore {
    pub fn new(calendar_hub: Arc<HubType>, calendar_id: impl Into<String>, time_zone: Tz) -> Self {
        Self {
            calendar_hub,
            calendar_id: calendar_id.into(),
            time_zone,
        }
    }

    fn to_record(&self, event: &Event) -> Result<BookingRecord, GcalServiceError> {
        event_to_record(event, self.time_zone)
            .ok_or_else(|| GcalServiceError::Malformed("event without id".to_string()))
    }

    async fn list_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, GcalServiceError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .calendar_hub
                .events()
                .list(&self.calendar_id)
                .time_min(range_start)
                .time_max(range_end)
                .single_events(true) // Expand recurring events
                .order_by("startTime");
            if let Some(token) = page_token.as_deref() {
                request = request.page_token(token);
            }

            let (_, page) = request.doit().await?;

            for event in page.items.unwrap_or_default() {
                if is_cancelled(&event) {
                    continue;
                }
                match event_to_record(&event, self.time_zone) {
                    Some(record) => records.push(record),
                    None => warn!("Skipping calendar event without id: {:?}", event.summary),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "Listed {} events between {} and {}",
            records.len(),
            range_start,
            range_end
        );
        Ok(records)
    }

    async fn fetch_event(&self, id: &str) -> Result<Option<BookingRecord>, GcalServiceError> {
        match self
            .calendar_hub
            .events()
            .get(&self.calendar_id, id)
            .doit()
            .await
        {
            Ok((_, event)) if is_cancelled(&event) => Ok(None),
            Ok((_, event)) => self.to_record(&event).map(Some),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(GcalServiceError::ApiError(err)),
        }
    }

    async fn insert_event(&self, fields: NewBookingRecord) -> Result<BookingRecord, GcalServiceError> {
        let event = new_record_to_event(&fields, self.time_zone.name());
        let (_, created) = self
            .calendar_hub
            .events()
            .insert(event, &self.calendar_id)
            .doit()
            .await?;
        let record = self.to_record(&created)?;
        info!("Created calendar event {} for {}", record.id, record.customer_name);
        Ok(record)
    }

    async fn patch_event(&self, id: &str, patch: RecordPatch) -> Result<BookingRecord, GcalServiceError> {
        let (_, updated) = self
            .calendar_hub
            .events()
            .patch(patch_to_event(&patch), &self.calendar_id, id)
            .doit()
            .await
            .map_err(|e| api_error(e, id))?;
        self.to_record(&updated)
    }

    async fn remove_event(&self, id: &str) -> Result<(), GcalServiceError> {
        self.calendar_hub
            .events()
            .delete(&self.calendar_id, id)
            .send_updates("none")
            .doit()
            .await
            .map_err(|e| api_error(e, id))?;
        info!("Deleted calendar event {}", id);
        Ok(())
    }
}

impl EventStore for GoogleCalendarStore {
    fn query_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, StoreError> {
        Box::pin(async move { Ok(self.list_events(range_start, range_end).await?) })
    }

    fn get_event(&self, id: &str) -> BoxFuture<'_, Option<BookingRecord>, StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.fetch_event(&id).await?) })
    }

    fn create_event(&self, fields: NewBookingRecord) -> BoxFuture<'_, BookingRecord, StoreError> {
        Box::pin(async move { Ok(self.insert_event(fields).await?) })
    }

    fn update_event(
        &self,
        id: &str,
        patch: RecordPatch,
    ) -> BoxFuture<'_, BookingRecord, StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.patch_event(&id, patch).await?) })
    }

    fn delete_event(&self, id: &str) -> BoxFuture<'_, (), StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.remove_event(&id).await?) })
    }
}
