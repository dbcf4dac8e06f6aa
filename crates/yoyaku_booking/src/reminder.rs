// --- File: crates/yoyaku_booking/src/reminder.rs ---
//! Reminder sweeps. Idempotency comes from the per-record flags, so
//! overlapping runs never send twice.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use yoyaku_availability::AvailabilityResolver;
use yoyaku_common::models::{BookingRecord, OperationalAlert, RecordPatch, ReminderFlags};
use yoyaku_common::services::{AlertSink, EventStore, Notifier};
use yoyaku_config::ReminderConfig;

use crate::error::BookingError;
use crate::messages::{day_before_text, imminent_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SweepKind {
    DayBefore,
    Imminent,
    /// Whatever the scheduler would run at this instant.
    #[default]
    Due,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SweepReport {
    /// Confirmed records starting inside the sweep window.
    pub examined: usize,
    pub sent: usize,
    /// Already flagged, or no identity to send to.
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReminderRunReport {
    pub day_before: Option<SweepReport>,
    pub imminent: Option<SweepReport>,
}

struct Sweep<'a> {
    name: &'static str,
    query_start: DateTime<Utc>,
    query_end: DateTime<Utc>,
    starts_in_window: &'a (dyn Fn(DateTime<Utc>) -> bool + Sync),
    already_sent: fn(&ReminderFlags) -> bool,
    text: &'a (dyn Fn(&BookingRecord, DateTime<Utc>) -> String + Sync),
    patch: RecordPatch,
}

pub struct ReminderService {
    resolver: Arc<AvailabilityResolver>,
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    alerts: Arc<dyn AlertSink>,
    config: ReminderConfig,
}

impl ReminderService {
    pub fn new(
        resolver: Arc<AvailabilityResolver>,
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
        alerts: Arc<dyn AlertSink>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            notifier,
            alerts,
            config,
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Reminds every confirmed booking on the next local day.
    pub async fn run_day_before_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, BookingError> {
        let today = self.resolver.local_date(now);
        let window = today
            .succ_opt()
            .and_then(|tomorrow| self.resolver.day_window(tomorrow));
        let Some((day_start, day_end)) = window else {
            warn!("No local day after {}; day-before sweep skipped", today);
            return Ok(SweepReport::default());
        };
        let time_zone = self.resolver.time_zone();
        self.sweep(Sweep {
            name: "day-before",
            query_start: day_start,
            query_end: day_end,
            starts_in_window: &move |start: DateTime<Utc>| start >= day_start && start < day_end,
            already_sent: |flags: &ReminderFlags| flags.day_before_sent,
            text: &move |_: &BookingRecord, start: DateTime<Utc>| day_before_text(start, time_zone),
            patch: RecordPatch::day_before_sent(),
        })
        .await
    }

    /// Reminds bookings starting in `(now + lead - interval, now + lead + tolerance]`,
    /// where `interval` is the sweep interval. Windows of consecutive ticks
    /// tile the timeline, so each booking falls into one tick whatever the
    /// ticks' phase; the flag absorbs the tolerance overlap.
    pub async fn run_imminent_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, BookingError> {
        let target = now + Duration::minutes(self.config.imminent_lead_minutes);
        let tolerance = Duration::minutes(self.config.imminent_tolerance_minutes);
        let (low, high) = (target - self.sweep_interval(), target + tolerance);
        self.sweep(Sweep {
            name: "imminent",
            query_start: low,
            // Half-open query; a record starting exactly at `high` must be seen.
            query_end: high + Duration::seconds(1),
            starts_in_window: &move |start: DateTime<Utc>| start > low && start <= high,
            already_sent: |flags: &ReminderFlags| flags.fifteen_minute_sent,
            text: &|_: &BookingRecord, _: DateTime<Utc>| imminent_text().to_string(),
            patch: RecordPatch::fifteen_minute_sent(),
        })
        .await
    }

    fn sweep_interval(&self) -> Duration {
        let secs = self.config.sweep_interval_secs.clamp(1, 24 * 60 * 60);
        Duration::seconds(secs as i64)
    }

    /// The imminent sweep, plus the day-before sweep during its local hour.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<ReminderRunReport, BookingError> {
        let imminent = self.run_imminent_sweep(now).await?;
        let local_hour = now.with_timezone(&self.resolver.time_zone()).hour();
        let day_before = if local_hour == self.config.day_before_hour {
            Some(self.run_day_before_sweep(now).await?)
        } else {
            None
        };
        Ok(ReminderRunReport {
            day_before,
            imminent: Some(imminent),
        })
    }

    pub async fn run(&self, kind: SweepKind, now: DateTime<Utc>) -> Result<ReminderRunReport, BookingError> {
        match kind {
            SweepKind::DayBefore => Ok(ReminderRunReport {
                day_before: Some(self.run_day_before_sweep(now).await?),
                imminent: None,
            }),
            SweepKind::Imminent => Ok(ReminderRunReport {
                day_before: None,
                imminent: Some(self.run_imminent_sweep(now).await?),
            }),
            SweepKind::Due => self.run_due(now).await,
        }
    }

    async fn sweep(&self, sweep: Sweep<'_>) -> Result<SweepReport, BookingError> {
        let records = match self.store.query_events(sweep.query_start, sweep.query_end).await {
            Ok(records) => records,
            Err(e) => {
                error!("{} sweep could not query records: {}", sweep.name, e);
                let alert = OperationalAlert::SystemError {
                    message: format!("{} reminder sweep failed: {}", sweep.name, e),
                    occurred_at: Utc::now(),
                };
                if let Err(alert_err) = self.alerts.send_operational_alert(alert).await {
                    warn!("Operational alert not delivered: {}", alert_err);
                }
                return Err(BookingError::from(e));
            }
        };

        let mut report = SweepReport::default();
        for record in records.iter().filter(|r| r.is_confirmed()) {
            let Some(start_at) = record.start_at.filter(|s| (sweep.starts_in_window)(*s)) else {
                continue;
            };
            report.examined += 1;

            if (sweep.already_sent)(&record.reminder_flags) {
                report.skipped += 1;
                continue;
            }
            let Some(identity_id) = record.external_identity_id.as_deref() else {
                debug!("{} has no LINE identity; no {} reminder", record.id, sweep.name);
                report.skipped += 1;
                continue;
            };

            let text = (sweep.text)(record, start_at);
            if let Err(e) = self.notifier.push_notification(identity_id, &text).await {
                warn!("{} reminder for {} failed: {}", sweep.name, record.id, e);
                report.failed += 1;
                continue;
            }
            report.sent += 1;

            if let Err(e) = self.store.update_event(&record.id, sweep.patch).await {
                error!(
                    "{} reminder sent for {} but flag not stored: {}",
                    sweep.name, record.id, e
                );
            }
        }

        info!(
            "{} sweep: examined {}, sent {}, skipped {}, failed {}",
            sweep.name, report.examined, report.sent, report.skipped, report.failed
        );
        Ok(report)
    }
}
