// --- File: crates/yoyaku_availability/src/holidays.rs ---
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;
use yoyaku_config::{BusinessConfig, CalendarConfig};

use crate::error::AvailabilityError;

/// Static set of non-bookable local calendar days.
///
/// Covers closed weekdays, public holidays and company closures. All lookups
/// take a local `NaiveDate`, so time of day and offsets never matter.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
    closures: BTreeSet<NaiveDate>,
    closed_weekdays: Vec<Weekday>,
}

impl HolidayCalendar {
    pub fn new(
        holidays: impl IntoIterator<Item = NaiveDate>,
        closures: impl IntoIterator<Item = NaiveDate>,
        closed_weekdays: Vec<Weekday>,
    ) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            closures: closures.into_iter().collect(),
            closed_weekdays,
        }
    }

    pub fn from_config(
        calendar: &CalendarConfig,
        business: &BusinessConfig,
    ) -> Result<Self, AvailabilityError> {
        let holidays = parse_dates(&calendar.holidays)?;
        let closures = parse_dates(&calendar.closure_days)?;
        let closed_weekdays = business
            .closed_weekdays
            .iter()
            .map(|raw| parse_weekday(raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(holidays, closures, closed_weekdays))
    }

    /// `true` for closed weekdays, holidays and closure days.
    pub fn is_unavailable_day(&self, date: NaiveDate) -> bool {
        self.is_closed_weekday(date) || self.is_holiday(date) || self.is_closure_day(date)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_closure_day(&self, date: NaiveDate) -> bool {
        self.closures.contains(&date)
    }

    pub fn is_closed_weekday(&self, date: NaiveDate) -> bool {
        self.closed_weekdays.contains(&date.weekday())
    }
}

fn parse_dates(raw: &[String]) -> Result<Vec<NaiveDate>, AvailabilityError> {
    raw.iter()
        .map(|value| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .map_err(|_| AvailabilityError::InvalidDate(value.clone()))
        })
        .collect()
}

/// Accepts weekday names ("Tue", "tuesday") or numbers with 0 = Sunday.
pub(crate) fn parse_weekday(raw: &str) -> Result<Weekday, AvailabilityError> {
    let trimmed = raw.trim();
    if let Ok(number) = trimmed.parse::<u8>() {
        return match number {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => Err(AvailabilityError::InvalidWeekday(raw.to_string())),
        };
    }
    trimmed
        .parse::<Weekday>()
        .map_err(|_| AvailabilityError::InvalidWeekday(raw.to_string()))
}
