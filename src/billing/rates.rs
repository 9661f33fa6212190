//! Rate schedule: the immutable tariff the fee engine prices against

use crate::billing::error::{FeeError, FeeResult};
use crate::domain::types::RateClass;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Reference tariff
pub const DEFAULT_BASE_FEE: u64 = 40;
pub const DEFAULT_BASE_WINDOW_HOURS: u64 = 3;
pub const DEFAULT_DAILY_FEE: u64 = 5000;
pub const DEFAULT_HOURS_PER_DAY: u64 = 24;
pub const DEFAULT_CONTINUOUS_GAP_MAX_HOURS: u64 = 1;

/// Hourly rate per class, charged for each hour past the base window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRates {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
}

impl HourlyRates {
    #[inline]
    pub fn rate(&self, class: RateClass) -> u64 {
        match class {
            RateClass::Small => self.small,
            RateClass::Medium => self.medium,
            RateClass::Large => self.large,
        }
    }
}

impl Default for HourlyRates {
    fn default() -> Self {
        Self { small: 20, medium: 60, large: 100 }
    }
}

/// Process-wide tariff, built once at startup and shared read-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSchedule {
    base_fee: u64,
    base_window_hours: u64,
    hourly: HourlyRates,
    daily_fee: u64,
    hours_per_day: u64,
    continuous_gap_max_hours: u64,
    continuous_gap: Duration,
    /// Classes ordered by hourly rate, most expensive first
    priority: [RateClass; 3],
}

impl RateSchedule {
    pub fn new(
        base_fee: u64,
        base_window_hours: u64,
        hourly: HourlyRates,
        daily_fee: u64,
        hours_per_day: u64,
        continuous_gap_max_hours: u64,
    ) -> FeeResult<Self> {
        if base_window_hours == 0 {
            return Err(FeeError::InvalidArgument("base window must be at least one hour".into()));
        }
        if hours_per_day == 0 {
            return Err(FeeError::InvalidArgument("hours per day must be positive".into()));
        }
        if let Some(class) = RateClass::ALL.iter().find(|c| hourly.rate(**c) == 0) {
            return Err(FeeError::InvalidArgument(format!("hourly rate for {class} must be positive")));
        }
        let continuous_gap = i64::try_from(continuous_gap_max_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| {
                FeeError::InvalidArgument(format!(
                    "continuous gap of {continuous_gap_max_hours}h is out of range"
                ))
            })?;

        Ok(Self {
            base_fee,
            base_window_hours,
            hourly,
            daily_fee,
            hours_per_day,
            continuous_gap_max_hours,
            continuous_gap,
            priority: Self::rank_by_rate(&hourly),
        })
    }

    /// Order classes by rate descending; equal rates put the larger class first
    fn rank_by_rate(hourly: &HourlyRates) -> [RateClass; 3] {
        let mut classes = RateClass::ALL;
        classes.sort_by(|a, b| hourly.rate(*b).cmp(&hourly.rate(*a)).then(b.cmp(a)));
        classes
    }

    pub fn base_fee(&self) -> u64 {
        self.base_fee
    }

    pub fn base_window_hours(&self) -> u64 {
        self.base_window_hours
    }

    pub fn hourly(&self) -> &HourlyRates {
        &self.hourly
    }

    #[inline]
    pub fn hourly_rate(&self, class: RateClass) -> u64 {
        self.hourly.rate(class)
    }

    pub fn daily_fee(&self) -> u64 {
        self.daily_fee
    }

    pub fn hours_per_day(&self) -> u64 {
        self.hours_per_day
    }

    pub fn continuous_gap_max_hours(&self) -> u64 {
        self.continuous_gap_max_hours
    }

    /// Longest exit-to-entry gap that still counts as one stay
    #[inline]
    pub fn continuous_gap(&self) -> Duration {
        self.continuous_gap
    }

    /// Classes in proration priority order (highest hourly rate first)
    pub fn classes_by_rate_desc(&self) -> &[RateClass; 3] {
        &self.priority
    }

    /// Split billable hours into whole days and leftover hours
    #[inline]
    pub fn split_days(&self, hours: u64) -> (u64, u64) {
        (hours / self.hours_per_day, hours % self.hours_per_day)
    }

    /// Flat base fee for the first window, hourly rate for every hour after it.
    /// Zero hours cost nothing.
    pub fn hourly_block_fee(&self, hours: u64, class: RateClass) -> FeeResult<u64> {
        if hours == 0 {
            return Ok(0);
        }
        if hours <= self.base_window_hours {
            return Ok(self.base_fee);
        }
        (hours - self.base_window_hours)
            .checked_mul(self.hourly_rate(class))
            .and_then(|excess| excess.checked_add(self.base_fee))
            .ok_or_else(FeeError::overflow)
    }

    /// Daily fee times whole days
    pub fn days_fee(&self, days: u64) -> FeeResult<u64> {
        days.checked_mul(self.daily_fee).ok_or_else(FeeError::overflow)
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        let hourly = HourlyRates::default();
        Self {
            base_fee: DEFAULT_BASE_FEE,
            base_window_hours: DEFAULT_BASE_WINDOW_HOURS,
            hourly,
            daily_fee: DEFAULT_DAILY_FEE,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            continuous_gap_max_hours: DEFAULT_CONTINUOUS_GAP_MAX_HOURS,
            continuous_gap: Duration::hours(DEFAULT_CONTINUOUS_GAP_MAX_HOURS as i64),
            priority: Self::rank_by_rate(&hourly),
        }
    }
}
