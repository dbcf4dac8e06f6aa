// --- File: crates/yoyaku_booking/src/availability.rs ---
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, error};
use yoyaku_availability::{AvailabilityResolver, DayAvailability};
use yoyaku_common::models::BookingRecord;
use yoyaku_common::services::EventStore;

use crate::cache::{week_key, AvailabilityCache};
use crate::error::BookingError;

/// Longest inclusive range one availability request may cover.
pub const MAX_RANGE_DAYS: i64 = 62;

/// Read path: per-day slot statuses for a date range, fetched a week at a time.
pub struct AvailabilityService {
    resolver: Arc<AvailabilityResolver>,
    store: Arc<dyn EventStore>,
    cache: Arc<AvailabilityCache>,
}

impl AvailabilityService {
    pub fn new(
        resolver: Arc<AvailabilityResolver>,
        store: Arc<dyn EventStore>,
        cache: Arc<AvailabilityCache>,
    ) -> Self {
        Self {
            resolver,
            store,
            cache,
        }
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }

    pub async fn range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DayAvailability>, BookingError> {
        if to < from {
            return Err(BookingError::Validation(
                "to must not be before from".to_string(),
            ));
        }
        if (to - from).num_days() + 1 > MAX_RANGE_DAYS {
            return Err(BookingError::Validation(format!(
                "range must cover at most {} days",
                MAX_RANGE_DAYS
            )));
        }

        let mut days = Vec::new();
        let mut week = week_key(from);
        while week <= to {
            let records = self.week_records(week, now).await?;
            for offset in 0..7 {
                let date = week + Duration::days(offset);
                if date >= from && date <= to {
                    days.push(self.resolver.day_availability(date, &records));
                }
            }
            week += Duration::days(7);
        }
        Ok(days)
    }

    async fn week_records(
        &self,
        week: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        if let Some(records) = self.cache.get(week, now) {
            debug!("availability cache hit for week {}", week);
            return Ok(records);
        }

        let window = self.resolver.validation_window(week).zip(
            self.resolver
                .validation_window(week + Duration::days(6)),
        );
        let Some(((start, _), (_, end))) = window else {
            return Err(BookingError::Validation(format!(
                "week of {} has no local days",
                week
            )));
        };
        let records = self.store.query_events(start, end).await.map_err(|e| {
            error!("Failed to query records for week {}: {}", week, e);
            BookingError::from(e)
        })?;
        self.cache.put(week, records.clone(), now);
        Ok(records)
    }
}
