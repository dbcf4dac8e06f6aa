// --- File: crates/yoyaku_booking/src/cache.rs ---
//! Week-keyed cache of raw store records for the availability read path.
//!
//! Entries are keyed by the Monday of the local week. A successful write
//! invalidates its week; a slot conflict invalidates everything, since the
//! customer was evidently looking at stale data.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use yoyaku_common::models::BookingRecord;

/// Monday of the week containing `date`.
pub fn week_key(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[derive(Debug, Clone)]
struct CachedWeek {
    fetched_at: DateTime<Utc>,
    records: Vec<BookingRecord>,
}

#[derive(Debug)]
pub struct AvailabilityCache {
    ttl: Duration,
    weeks: Mutex<HashMap<NaiveDate, CachedWeek>>,
}

impl AvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            weeks: Mutex::new(HashMap::new()),
        }
    }

    /// Cached records for `week`, if still fresh at `now`.
    pub fn get(&self, week: NaiveDate, now: DateTime<Utc>) -> Option<Vec<BookingRecord>> {
        let weeks = self.weeks.lock().ok()?;
        let cached = weeks.get(&week)?;
        if now - cached.fetched_at >= self.ttl {
            debug!("availability cache for week {} is stale", week);
            return None;
        }
        Some(cached.records.clone())
    }

    /// Stores `records` for `week` and drops every entry that has gone stale,
    /// so the map never holds more than one TTL's worth of fetched weeks.
    pub fn put(&self, week: NaiveDate, records: Vec<BookingRecord>, now: DateTime<Utc>) {
        if let Ok(mut weeks) = self.weeks.lock() {
            let ttl = self.ttl;
            weeks.retain(|_, cached| now - cached.fetched_at < ttl);
            weeks.insert(
                week,
                CachedWeek {
                    fetched_at: now,
                    records,
                },
            );
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.weeks.lock().map(|weeks| weeks.len()).unwrap_or(0)
    }

    pub fn invalidate(&self, week: NaiveDate) {
        if let Ok(mut weeks) = self.weeks.lock() {
            weeks.remove(&week);
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut weeks) = self.weeks.lock() {
            weeks.clear();
        }
    }
}
