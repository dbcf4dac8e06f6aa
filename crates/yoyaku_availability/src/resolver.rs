// --- File: crates/yoyaku_availability/src/resolver.rs ---
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use yoyaku_common::models::BookingRecord;
use yoyaku_config::AppConfig;

use crate::blocking::{CategoryRule, EventCategory};
use crate::error::AvailabilityError;
use crate::fixed_rules::FixedRuleSet;
use crate::holidays::HolidayCalendar;

/// A day with at most this many open slots is shown as `few`.
pub const FEW_SLOTS_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Holiday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Holiday,
    Full,
    Few,
    Available,
}

/// Why a slot is or is not bookable. The write path turns each variant into
/// a distinct error; the read path only needs [`SlotStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotVerdict {
    Available,
    Holiday,
    FixedRule { rule: String },
    Overlap { event_id: String },
    AdjacentEvent { event_id: String, category: EventCategory },
    /// The local slot time has no instant (time zone gap).
    NotOffered,
}

impl SlotVerdict {
    pub fn status(&self) -> SlotStatus {
        match self {
            SlotVerdict::Available => SlotStatus::Available,
            SlotVerdict::Holiday => SlotStatus::Holiday,
            _ => SlotStatus::Booked,
        }
    }
}

/// One-hour slot, identified by its local start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    hour: u32,
}

impl TimeSlot {
    pub fn hour(&self) -> u32 {
        self.hour
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.hour)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open_hour: u32,
    /// Exclusive; the last slot starts one hour earlier.
    pub close_hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub time: TimeSlot,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub slots: Vec<SlotAvailability>,
}

/// Composes the calendar, fixed rules, derived blocking and direct overlap
/// into one status per slot.
#[derive(Debug, Clone)]
pub struct AvailabilityResolver {
    time_zone: Tz,
    hours: BusinessHours,
    calendar: HolidayCalendar,
    fixed_rules: FixedRuleSet,
    category_rules: Vec<CategoryRule>,
}

impl AvailabilityResolver {
    pub fn new(
        time_zone: Tz,
        hours: BusinessHours,
        calendar: HolidayCalendar,
        fixed_rules: FixedRuleSet,
        category_rules: Vec<CategoryRule>,
    ) -> Result<Self, AvailabilityError> {
        if hours.open_hour >= hours.close_hour || hours.close_hour > 24 {
            return Err(AvailabilityError::InvalidBusinessHours {
                open: hours.open_hour,
                close: hours.close_hour,
            });
        }
        Ok(Self {
            time_zone,
            hours,
            calendar,
            fixed_rules,
            category_rules,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AvailabilityError> {
        let business = &config.business;
        let time_zone = Tz::from_str(&business.time_zone)
            .map_err(|_| AvailabilityError::InvalidTimeZone(business.time_zone.clone()))?;
        let hours = BusinessHours {
            open_hour: business.open_hour,
            close_hour: business.close_hour,
        };
        let calendar = HolidayCalendar::from_config(&config.calendar, business)?;
        let fixed_rules = FixedRuleSet::from_config(&config.blocking.fixed_rules)?;
        let category_rules = [
            (EventCategory::InPerson, &config.blocking.in_person),
            (EventCategory::Shooting, &config.blocking.shooting),
        ]
        .into_iter()
        .filter_map(|(category, rule)| {
            CategoryRule::from_config(category, rule, time_zone, hours.open_hour)
        })
        .collect();

        debug!(
            "availability rules loaded: {} fixed rules, time zone {}",
            fixed_rules.len(),
            time_zone
        );
        Self::new(time_zone, hours, calendar, fixed_rules, category_rules)
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Every slot offered on a business day, in order.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        (self.hours.open_hour..self.hours.close_hour)
            .map(|hour| TimeSlot { hour })
            .collect()
    }

    /// Parses `HH:MM` into an offered slot. Minutes must be zero and the hour
    /// must be inside business hours.
    pub fn parse_time_slot(&self, raw: &str) -> Option<TimeSlot> {
        let (hour, minute) = raw.trim().split_once(':')?;
        let hour: u32 = hour.parse().ok()?;
        let minute: u32 = minute.parse().ok()?;
        if minute != 0 || hour < self.hours.open_hour || hour >= self.hours.close_hour {
            return None;
        }
        Some(TimeSlot { hour })
    }

    /// Local calendar day of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.time_zone).date_naive()
    }

    fn local_instant(&self, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        self.time_zone
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    /// `[start, end)` of a slot as absolute instants.
    pub fn slot_window(&self, date: NaiveDate, slot: TimeSlot) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.local_instant(date, slot.hour)?;
        Some((start, start + Duration::hours(1)))
    }

    /// Local midnight to the next local midnight.
    pub fn day_window(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.local_instant(date, 0)?;
        let end = self.local_instant(date.succ_opt()?, 0)?;
        Some((start, end))
    }

    /// The local day widened by the largest derived-block reach, so every
    /// event that could block a slot on `date` falls inside it.
    pub fn validation_window(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = self.day_window(date)?;
        let (before, after) = self.category_rules.iter().map(CategoryRule::reach).fold(
            (Duration::zero(), Duration::zero()),
            |(max_before, max_after), (before, after)| (max_before.max(before), max_after.max(after)),
        );
        // An event ending `after` before the window still blocks slots on `date`.
        Some((start - after, end + before))
    }

    pub fn is_unavailable_day(&self, date: NaiveDate) -> bool {
        self.calendar.is_unavailable_day(date)
    }

    pub fn is_fixed_blocked(&self, date: NaiveDate, hour: u32) -> bool {
        self.fixed_rules.is_fixed_blocked(date, hour)
    }

    /// Full reasoning for one slot.
    ///
    /// Order: calendar, fixed rules, direct overlap, derived blocks.
    /// Provisional records are dropped before anything else looks at them.
    pub fn evaluate(&self, date: NaiveDate, slot: TimeSlot, events: &[BookingRecord]) -> SlotVerdict {
        if self.calendar.is_unavailable_day(date) {
            return SlotVerdict::Holiday;
        }
        if let Some(rule) = self.fixed_rules.matching_rule(date, slot.hour) {
            return SlotVerdict::FixedRule {
                rule: rule.name.clone(),
            };
        }
        let Some((slot_start, slot_end)) = self.slot_window(date, slot) else {
            return SlotVerdict::NotOffered;
        };

        let confirmed: Vec<&BookingRecord> = events.iter().filter(|e| e.is_confirmed()).collect();

        if let Some(event) = confirmed
            .iter()
            .find(|event| event.overlaps(slot_start, slot_end))
        {
            return SlotVerdict::Overlap {
                event_id: event.id.clone(),
            };
        }

        for event in &confirmed {
            for rule in &self.category_rules {
                if rule.is_blocked_by_category(slot_start, slot_end, event) {
                    return SlotVerdict::AdjacentEvent {
                        event_id: event.id.clone(),
                        category: rule.category(),
                    };
                }
            }
        }

        SlotVerdict::Available
    }

    pub fn get_status(&self, date: NaiveDate, slot: TimeSlot, events: &[BookingRecord]) -> SlotStatus {
        self.evaluate(date, slot, events).status()
    }

    /// Calendar-grid rollup for one day.
    pub fn get_day_status(&self, date: NaiveDate, events: &[BookingRecord]) -> DayStatus {
        self.day_availability(date, events).status
    }

    /// Per-slot statuses plus the day rollup.
    pub fn day_availability(&self, date: NaiveDate, events: &[BookingRecord]) -> DayAvailability {
        let slots: Vec<SlotAvailability> = self
            .time_slots()
            .into_iter()
            .map(|time| SlotAvailability {
                time,
                status: self.get_status(date, time, events),
            })
            .collect();

        let status = if self.calendar.is_unavailable_day(date) {
            DayStatus::Holiday
        } else {
            let open = slots
                .iter()
                .filter(|slot| slot.status == SlotStatus::Available)
                .count();
            match open {
                0 => DayStatus::Full,
                n if n <= FEW_SLOTS_THRESHOLD => DayStatus::Few,
                _ => DayStatus::Available,
            }
        };

        DayAvailability {
            date,
            status,
            slots,
        }
    }
}
