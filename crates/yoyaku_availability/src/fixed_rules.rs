// --- File: crates/yoyaku_availability/src/fixed_rules.rs ---
use chrono::{Datelike, NaiveDate, Weekday};
use yoyaku_config::FixedRuleConfig;

use crate::error::AvailabilityError;
use crate::holidays::parse_weekday;

/// A recurring blackout window, independent of existing bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRule {
    pub name: String,
    /// `None` matches every weekday.
    pub weekday: Option<Weekday>,
    pub exclude_weekdays: Vec<Weekday>,
    pub hour_start: u32,
    /// Exclusive.
    pub hour_end: u32,
}

impl FixedRule {
    pub fn matches(&self, date: NaiveDate, hour: u32) -> bool {
        let weekday = date.weekday();
        self.weekday.map_or(true, |day| day == weekday)
            && !self.exclude_weekdays.contains(&weekday)
            && self.hour_start <= hour
            && hour < self.hour_end
    }

    fn from_config(config: &FixedRuleConfig) -> Result<Self, AvailabilityError> {
        if config.start_hour >= config.end_hour || config.end_hour > 24 {
            return Err(AvailabilityError::InvalidRule {
                name: config.name.clone(),
                reason: format!("hours {}-{} are not a range", config.start_hour, config.end_hour),
            });
        }
        let weekday = config.weekday.as_deref().map(parse_weekday).transpose()?;
        let exclude_weekdays = config
            .exclude_weekdays
            .iter()
            .map(|raw| parse_weekday(raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: config.name.clone(),
            weekday,
            exclude_weekdays,
            hour_start: config.start_hour,
            hour_end: config.end_hour,
        })
    }
}

/// All enabled fixed rules. Any match blocks.
#[derive(Debug, Clone, Default)]
pub struct FixedRuleSet {
    rules: Vec<FixedRule>,
}

impl FixedRuleSet {
    pub fn new(rules: Vec<FixedRule>) -> Self {
        Self { rules }
    }

    /// Builds the set from configuration, skipping disabled rules.
    pub fn from_config(configs: &[FixedRuleConfig]) -> Result<Self, AvailabilityError> {
        let rules = configs
            .iter()
            .filter(|config| config.enabled)
            .map(FixedRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_fixed_blocked(&self, date: NaiveDate, hour: u32) -> bool {
        self.matching_rule(date, hour).is_some()
    }

    /// First rule blocking the slot, if any.
    pub fn matching_rule(&self, date: NaiveDate, hour: u32) -> Option<&FixedRule> {
        self.rules.iter().find(|rule| rule.matches(date, hour))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
