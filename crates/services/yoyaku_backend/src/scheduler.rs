// --- File: crates/services/yoyaku_backend/src/scheduler.rs ---
//! Background loops: reminder sweeps and session reaping.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use yoyaku_booking::{ReminderService, SessionBridge};

/// Time from `now` to the next wall-clock multiple of `period_secs`
/// (`:00`, `:15`, `:30`, `:45` for a 900 s period). Zero when already on one.
pub(crate) fn delay_until_aligned(now: DateTime<Utc>, period_secs: u64) -> Duration {
    let period_ms = i64::try_from(period_secs.max(1))
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    let into_period = now.timestamp_millis().rem_euclid(period_ms);
    if into_period == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis((period_ms - into_period) as u64)
}

/// Runs the due reminder sweeps every `interval_secs`, on wall-clock
/// boundaries of that interval.
pub fn spawn_reminder_loop(reminders: Arc<ReminderService>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));
    let delay = delay_until_aligned(Utc::now(), interval_secs);
    info!(
        "Reminder sweeps every {}s, first in {}s",
        interval_secs,
        delay.as_secs()
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match reminders.run_due(Utc::now()).await {
                Ok(report) => debug!("reminder tick: {:?}", report),
                Err(e) => error!("reminder tick failed: {}", e),
            }
        }
    })
}

/// Deletes stale booking sessions every `interval_secs`.
pub fn spawn_session_reaper(sessions: Arc<SessionBridge>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = sessions.reap(Utc::now()).await {
                error!("session reaper failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::delay_until_aligned;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_first_reminder_tick_lands_on_quarter_hour() {
        let at = |h, m, s| Utc.with_ymd_and_hms(2025, 6, 5, h, m, s).unwrap();

        assert_eq!(delay_until_aligned(at(1, 7, 0), 900), Duration::from_secs(8 * 60));
        assert_eq!(delay_until_aligned(at(1, 44, 59), 900), Duration::from_secs(1));
        assert_eq!(delay_until_aligned(at(1, 45, 0), 900), Duration::ZERO);
        assert_eq!(delay_until_aligned(at(1, 59, 30), 3600), Duration::from_secs(30));
        // A zero period is treated as one second.
        assert_eq!(delay_until_aligned(at(1, 0, 0), 0), Duration::ZERO);
    }
}
