//! Fee for exactly one closed session

use crate::billing::error::{FeeError, FeeResult};
use crate::billing::rates::RateSchedule;
use crate::domain::session::ParkingSession;

pub const SECONDS_PER_HOUR: i64 = 3600;

/// Round elapsed seconds up to whole hours, billing at least one hour.
///
/// Integer division only, so a stay that lands exactly on an hour boundary
/// is never pushed into the next hour.
#[inline]
pub fn billable_hours(elapsed_seconds: i64) -> u64 {
    let hours = (elapsed_seconds.max(0) + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR;
    hours.max(1) as u64
}

/// Elapsed seconds of a closed session, rejecting active or inverted ones
pub(crate) fn closed_elapsed(session: &ParkingSession) -> FeeResult<i64> {
    let exit = session
        .exit_at
        .ok_or_else(|| FeeError::ActiveSession { ticket: session.ticket.clone() })?;
    if exit < session.entry_at {
        return Err(FeeError::InvalidArgument(format!(
            "ticket {} exits before it enters",
            session.ticket
        )));
    }
    Ok((exit - session.entry_at).num_seconds())
}

/// Prices a single session against the schedule
pub struct SingleSessionFeeCalculator<'a> {
    schedule: &'a RateSchedule,
}

impl<'a> SingleSessionFeeCalculator<'a> {
    pub fn new(schedule: &'a RateSchedule) -> Self {
        Self { schedule }
    }

    pub fn compute_fee(&self, session: &ParkingSession) -> FeeResult<u64> {
        let elapsed = closed_elapsed(session)?;
        self.fee_for_hours(billable_hours(elapsed), session)
    }

    fn fee_for_hours(&self, duration_hours: u64, session: &ParkingSession) -> FeeResult<u64> {
        let (days, remainder) = self.schedule.split_days(duration_hours);
        if days > 0 {
            let block = self.schedule.hourly_block_fee(remainder, session.rate_class)?;
            self.schedule.days_fee(days)?.checked_add(block).ok_or_else(FeeError::overflow)
        } else {
            self.schedule.hourly_block_fee(duration_hours, session.rate_class)
        }
    }
}
