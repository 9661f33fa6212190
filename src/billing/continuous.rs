//! Continuous-rate aggregation over a vehicle's session history
//!
//! Sessions whose exit-to-next-entry gap is within the schedule's continuous
//! gap are stitched into one segment. A segment bills only the time actually
//! parked; the gaps that made it continuous are never billed.

use crate::billing::error::{FeeError, FeeResult};
use crate::billing::proration::{ClassDurations, MixedClassProration};
use crate::billing::rates::RateSchedule;
use crate::billing::single::{billable_hours, closed_elapsed, SingleSessionFeeCalculator};
use crate::domain::session::ParkingSession;
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::borrow::Borrow;

/// Whether a return at `next_entry` continues a stay that ended at `previous_exit`.
///
/// This is the single rule shared by segmentation and by the orchestrator's
/// previous-ticket link, so the two can never disagree.
pub fn is_continuous(
    schedule: &RateSchedule,
    previous_exit: DateTime<Utc>,
    next_entry: DateTime<Utc>,
) -> bool {
    next_entry - previous_exit <= schedule.continuous_gap()
}

/// A maximal run of continuous sessions, in entry order
#[derive(Debug, Clone)]
pub struct Segment<'s> {
    sessions: SmallVec<[&'s ParkingSession; 4]>,
}

impl<'s> Segment<'s> {
    fn starting_with(session: &'s ParkingSession) -> Self {
        let mut sessions = SmallVec::new();
        sessions.push(session);
        Self { sessions }
    }

    pub fn sessions(&self) -> &[&'s ParkingSession] {
        &self.sessions
    }

    fn last(&self) -> &'s ParkingSession {
        self.sessions[self.sessions.len() - 1]
    }

    /// Parked time per class; callers have already validated every session
    pub fn class_durations(&self) -> ClassDurations {
        let mut durations = ClassDurations::new();
        for session in &self.sessions {
            durations.add(session.rate_class, session.elapsed_seconds().unwrap_or(0));
        }
        durations
    }
}

/// Partition sessions into continuous segments.
///
/// Sessions are stably sorted by entry instant first, so callers need not
/// pre-sort. Every session must be closed.
pub fn segments<'s, S: Borrow<ParkingSession>>(
    schedule: &RateSchedule,
    sessions: &'s [S],
) -> FeeResult<Vec<Segment<'s>>> {
    if sessions.is_empty() {
        return Err(FeeError::InvalidArgument("no sessions to aggregate".into()));
    }

    let mut ordered: Vec<&'s ParkingSession> = Vec::with_capacity(sessions.len());
    for session in sessions {
        let session = session.borrow();
        closed_elapsed(session)?;
        ordered.push(session);
    }
    ordered.sort_by_key(|s| s.entry_at);

    let mut result: Vec<Segment<'s>> = Vec::new();
    for session in ordered {
        let continues = result.last().is_some_and(|current| {
            current.last().exit_at.is_some_and(|exit| is_continuous(schedule, exit, session.entry_at))
        });
        if continues {
            if let Some(current) = result.last_mut() {
                current.sessions.push(session);
                continue;
            }
        }
        result.push(Segment::starting_with(session));
    }
    Ok(result)
}

/// Priced view of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFee {
    pub tickets: Vec<String>,
    pub parked_seconds: i64,
    pub billed_hours: u64,
    pub days: u64,
    pub mixed_classes: bool,
    pub fee: u64,
}

/// Bills a vehicle's full history under the continuous-rate rule
pub struct ContinuousSessionAggregator<'a> {
    schedule: &'a RateSchedule,
}

impl<'a> ContinuousSessionAggregator<'a> {
    pub fn new(schedule: &'a RateSchedule) -> Self {
        Self { schedule }
    }

    pub fn compute_fee<S: Borrow<ParkingSession>>(&self, sessions: &[S]) -> FeeResult<u64> {
        if let [only] = sessions {
            return SingleSessionFeeCalculator::new(self.schedule).compute_fee(only.borrow());
        }
        total_fee(&self.breakdown(sessions)?)
    }

    /// Per-segment pricing, in entry order
    pub fn breakdown<S: Borrow<ParkingSession>>(&self, sessions: &[S]) -> FeeResult<Vec<SegmentFee>> {
        let segments = segments(self.schedule, sessions)?;
        segments.iter().map(|segment| self.price_segment(segment)).collect()
    }

    fn price_segment(&self, segment: &Segment<'_>) -> FeeResult<SegmentFee> {
        let per_class = segment.class_durations();
        let parked_seconds = per_class.total_seconds();
        let billed_hours = billable_hours(parked_seconds);
        let (days, remainder) = self.schedule.split_days(billed_hours);

        let hours = if days > 0 { remainder } else { billed_hours };
        let block_fee = match per_class.single_class() {
            _ if hours == 0 => 0,
            Some(class) => self.schedule.hourly_block_fee(hours, class)?,
            None => MixedClassProration::new(self.schedule).price(hours, &per_class)?,
        };
        let fee = self.schedule.days_fee(days)?.checked_add(block_fee).ok_or_else(FeeError::overflow)?;

        Ok(SegmentFee {
            tickets: segment.sessions().iter().map(|s| s.ticket.clone()).collect(),
            parked_seconds,
            billed_hours,
            days,
            mixed_classes: per_class.single_class().is_none(),
            fee,
        })
    }
}

/// Sum of segment fees
pub fn total_fee(segments: &[SegmentFee]) -> FeeResult<u64> {
    segments
        .iter()
        .try_fold(0u64, |total, segment| total.checked_add(segment.fee))
        .ok_or_else(FeeError::overflow)
}
