//! Fee engine - turns closed parking sessions into amounts
//!
//! Components, leaves first:
//! - `rates` - immutable rate schedule
//! - `single` - fee for one closed session
//! - `proration` - excess hours across mixed rate classes
//! - `continuous` - segmentation of a vehicle's history and per-segment pricing
//!
//! The engine is pure: no I/O, no clock, no logging. `FeeEngine` is the facade
//! the orchestrator holds; it shares the schedule through an `Arc` and can be
//! cloned into any number of threads.

pub mod continuous;
pub mod error;
pub mod proration;
pub mod rates;
pub mod single;

pub use continuous::{is_continuous, total_fee, ContinuousSessionAggregator, SegmentFee};
pub use error::{FeeError, FeeResult};
pub use proration::{ClassDurations, MixedClassProration};
pub use rates::{HourlyRates, RateSchedule};
pub use single::{billable_hours, SingleSessionFeeCalculator};

use crate::domain::session::ParkingSession;
use chrono::{DateTime, Utc};
use std::borrow::Borrow;
use std::sync::Arc;

/// Shared entry point to the fee engine
#[derive(Debug, Clone)]
pub struct FeeEngine {
    schedule: Arc<RateSchedule>,
}

impl FeeEngine {
    pub fn new(schedule: RateSchedule) -> Self {
        Self { schedule: Arc::new(schedule) }
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    /// Fee for one closed session
    pub fn compute_fee(&self, session: &ParkingSession) -> FeeResult<u64> {
        SingleSessionFeeCalculator::new(&self.schedule).compute_fee(session)
    }

    /// Fee for a vehicle's sessions under the continuous-rate rule
    pub fn compute_continuous_fee<S: Borrow<ParkingSession>>(&self, sessions: &[S]) -> FeeResult<u64> {
        ContinuousSessionAggregator::new(&self.schedule).compute_fee(sessions)
    }

    /// Per-segment pricing of a vehicle's sessions
    pub fn continuous_breakdown<S: Borrow<ParkingSession>>(
        &self,
        sessions: &[S],
    ) -> FeeResult<Vec<SegmentFee>> {
        ContinuousSessionAggregator::new(&self.schedule).breakdown(sessions)
    }

    /// Shared continuity rule, see [`continuous::is_continuous`]
    pub fn is_continuous(&self, previous_exit: DateTime<Utc>, next_entry: DateTime<Utc>) -> bool {
        is_continuous(&self.schedule, previous_exit, next_entry)
    }
}
