//! Proration of excess hours across rate classes
//!
//! When a continuous segment spans several slot classes, the hours past the
//! base window are drawn from the most expensive class actually used first.
//! Only the per-class totals matter, not which hours were chronologically
//! in excess.

use crate::billing::error::{FeeError, FeeResult};
use crate::billing::rates::RateSchedule;
use crate::billing::single::SECONDS_PER_HOUR;
use crate::domain::types::RateClass;

#[inline]
fn class_index(class: RateClass) -> usize {
    match class {
        RateClass::Small => 0,
        RateClass::Medium => 1,
        RateClass::Large => 2,
    }
}

/// Time spent under each rate class within one segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassDurations {
    seconds: [i64; 3],
    present: [bool; 3],
}

impl ClassDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stay of `seconds` under `class`. Zero-length stays still mark
    /// the class as present.
    pub fn add(&mut self, class: RateClass, seconds: i64) {
        let idx = class_index(class);
        self.seconds[idx] += seconds.max(0);
        self.present[idx] = true;
    }

    #[inline]
    pub fn seconds(&self, class: RateClass) -> i64 {
        self.seconds[class_index(class)]
    }

    /// Hours under `class`, rounded up
    #[inline]
    pub fn ceil_hours(&self, class: RateClass) -> u64 {
        ((self.seconds(class) + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR) as u64
    }

    #[inline]
    pub fn contains(&self, class: RateClass) -> bool {
        self.present[class_index(class)]
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds.iter().sum()
    }

    /// Classes that appear in the segment, in size order
    pub fn classes(&self) -> impl Iterator<Item = RateClass> + '_ {
        RateClass::ALL.into_iter().filter(|c| self.contains(*c))
    }

    /// The class, if the segment used exactly one
    pub fn single_class(&self) -> Option<RateClass> {
        let mut classes = self.classes();
        match (classes.next(), classes.next()) {
            (Some(class), None) => Some(class),
            _ => None,
        }
    }
}

/// Prices mixed-class blocks in descending hourly-rate order
pub struct MixedClassProration<'a> {
    schedule: &'a RateSchedule,
}

impl<'a> MixedClassProration<'a> {
    pub fn new(schedule: &'a RateSchedule) -> Self {
        Self { schedule }
    }

    /// Price `duration_hours` of billable time given the per-class split.
    ///
    /// Excess hours not covered by the per-class totals (segment rounding and
    /// per-class rounding are independent) are billed at the rate of the last
    /// class drawn from, i.e. the cheapest class the segment used. With no
    /// class time at all the cheapest scheduled class is used.
    pub fn price(&self, duration_hours: u64, per_class: &ClassDurations) -> FeeResult<u64> {
        let base_fee = self.schedule.base_fee();
        if duration_hours <= self.schedule.base_window_hours() {
            return Ok(base_fee);
        }

        let mut remaining = duration_hours - self.schedule.base_window_hours();
        let mut fee = base_fee;
        let priority = self.schedule.classes_by_rate_desc();
        let mut last_class = priority[priority.len() - 1];

        for &class in priority.iter().filter(|c| per_class.contains(**c)) {
            last_class = class;
            let take = per_class.ceil_hours(class).min(remaining);
            fee = self.add_hours(fee, take, class)?;
            remaining -= take;
            if remaining == 0 {
                return Ok(fee);
            }
        }

        self.add_hours(fee, remaining, last_class)
    }

    fn add_hours(&self, fee: u64, hours: u64, class: RateClass) -> FeeResult<u64> {
        hours
            .checked_mul(self.schedule.hourly_rate(class))
            .and_then(|amount| fee.checked_add(amount))
            .ok_or_else(FeeError::overflow)
    }
}
