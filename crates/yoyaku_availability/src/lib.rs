// --- File: crates/yoyaku_availability/src/lib.rs ---
//! Decides, for any `(date, hour)` slot, whether it can be booked.
//!
//! Pure rules over an externally supplied event list: no store access, no
//! caching. The read path and the write-time re-validation share one
//! [`AvailabilityResolver`].

pub mod blocking;
pub mod error;
pub mod fixed_rules;
pub mod holidays;
#[cfg(test)]
mod holidays_test;
pub mod resolver;
#[cfg(test)]
mod resolver_proptest;

pub use blocking::{CategoryMatcher, CategoryRule, EventCategory};
pub use error::AvailabilityError;
pub use fixed_rules::{FixedRule, FixedRuleSet};
pub use holidays::HolidayCalendar;
pub use resolver::{
    AvailabilityResolver, BusinessHours, DayAvailability, DayStatus, SlotAvailability,
    SlotStatus, SlotVerdict, TimeSlot, FEW_SLOTS_THRESHOLD,
};
