// --- File: crates/yoyaku_availability/src/blocking.rs ---
//! Event-derived blocking: an existing event of a known category excludes
//! neighbouring slots, not just its own interval.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use yoyaku_common::models::BookingRecord;
use yoyaku_config::CategoryRuleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    InPerson,
    Shooting,
}

/// Tag-or-keyword category detection.
///
/// An event belongs to the category when its call-method tag equals the
/// configured value, or when its name contains one of the keywords.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    tag_value: String,
    name_keywords: Vec<String>,
}

impl CategoryMatcher {
    pub fn new(tag_value: impl Into<String>, name_keywords: Vec<String>) -> Self {
        Self {
            tag_value: tag_value.into(),
            name_keywords: name_keywords.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn matches(&self, event: &BookingRecord) -> bool {
        let tagged = !self.tag_value.is_empty()
            && event.call_method.as_deref() == Some(self.tag_value.as_str());
        tagged
            || self
                .name_keywords
                .iter()
                .any(|keyword| event.customer_name.contains(keyword.as_str()))
    }
}

#[derive(Debug, Clone)]
enum LookBack {
    Fixed(Duration),
    /// Back to the business opening hour of the event's local day.
    FromOpen { time_zone: Tz, open_hour: u32 },
}

/// One evaluator per category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    category: EventCategory,
    matcher: CategoryMatcher,
    look_back: LookBack,
    look_forward: Duration,
    /// A slot starting exactly at the block end is still blocked.
    end_inclusive: bool,
}

impl CategoryRule {
    /// Symmetric buffer: blocks `[start - before, end + after)`.
    pub fn in_person(matcher: CategoryMatcher, before: Duration, after: Duration) -> Self {
        Self {
            category: EventCategory::InPerson,
            matcher,
            look_back: LookBack::Fixed(before),
            look_forward: after,
            end_inclusive: false,
        }
    }

    /// Blocks from the opening hour of the event's day through `end + after`,
    /// including the slot that starts exactly at `end + after`.
    pub fn shooting(matcher: CategoryMatcher, time_zone: Tz, open_hour: u32, after: Duration) -> Self {
        Self {
            category: EventCategory::Shooting,
            matcher,
            look_back: LookBack::FromOpen {
                time_zone,
                open_hour,
            },
            look_forward: after,
            end_inclusive: true,
        }
    }

    pub(crate) fn from_config(
        category: EventCategory,
        config: &CategoryRuleConfig,
        time_zone: Tz,
        open_hour: u32,
    ) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let matcher = CategoryMatcher::new(
            config.call_method_value.clone(),
            config.name_keywords.clone(),
        );
        let look_back = if config.block_from_open {
            LookBack::FromOpen {
                time_zone,
                open_hour,
            }
        } else {
            LookBack::Fixed(Duration::hours(config.before_hours))
        };
        Some(Self {
            category,
            matcher,
            look_back,
            look_forward: Duration::hours(config.after_hours),
            end_inclusive: category == EventCategory::Shooting,
        })
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn applies_to(&self, event: &BookingRecord) -> bool {
        self.matcher.matches(event)
    }

    /// The interval this event excludes, or `None` if the rule does not apply
    /// or the event has no start.
    pub fn blocked_window(&self, event: &BookingRecord) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if !self.applies_to(event) {
            return None;
        }
        let (start, end) = event.interval()?;
        let window_start = match &self.look_back {
            LookBack::Fixed(before) => start - *before,
            LookBack::FromOpen {
                time_zone,
                open_hour,
            } => business_day_floor(start, *time_zone, *open_hour).min(start),
        };
        Some((window_start, end + self.look_forward))
    }

    /// Intersection of the candidate slot with the blocked window. The window
    /// end is exclusive unless the rule says otherwise.
    pub fn is_blocked_by_category(
        &self,
        candidate_start: DateTime<Utc>,
        candidate_end: DateTime<Utc>,
        event: &BookingRecord,
    ) -> bool {
        self.blocked_window(event).map_or(false, |(start, end)| {
            let reaches = if self.end_inclusive {
                end >= candidate_start
            } else {
                end > candidate_start
            };
            start < candidate_end && reaches
        })
    }

    /// Widest reach of this rule around an event, used to size re-fetch windows.
    pub(crate) fn reach(&self) -> (Duration, Duration) {
        let before = match &self.look_back {
            LookBack::Fixed(before) => *before,
            LookBack::FromOpen { .. } => Duration::zero(),
        };
        (before, self.look_forward)
    }
}

/// Opening instant of the business day `instant` falls on.
fn business_day_floor(instant: DateTime<Utc>, time_zone: Tz, open_hour: u32) -> DateTime<Utc> {
    let local_date = instant.with_timezone(&time_zone).date_naive();
    local_date
        .and_hms_opt(open_hour, 0, 0)
        .and_then(|opening| time_zone.from_local_datetime(&opening).earliest())
        .map(|opening| opening.with_timezone(&Utc))
        .unwrap_or(instant)
}
