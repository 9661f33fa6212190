//! Facility orchestrator
//!
//! Owns the slot layout, the ticket store and the fee engine. `park` and
//! `unpark` are the only operations that mutate state; everything else is a
//! read-only view for the CLI and audits.

use crate::billing::{total_fee, FeeEngine, FeeError, RateSchedule, SegmentFee};
use crate::domain::session::{ParkingSession, SessionError};
use crate::domain::types::{EntryPointId, SlotId, VehicleId, VehicleSize};
use crate::infra::config::{Config, SlotSpec};
use crate::infra::metrics::Metrics;
use crate::services::allocator::{nearest_slot, Slot};
use crate::services::ticket_store::TicketStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    #[error("layout has no slots")]
    EmptyLayout,

    #[error("layout has {found} entry points, at least {min} required")]
    TooFewEntryPoints { found: usize, min: usize },

    #[error("slot {slot} lists {got} distances, expected {expected}")]
    RaggedDistances { slot: usize, expected: usize, got: usize },

    #[error("new entry point lists {got} distances, facility has {expected} slots")]
    EntryDistanceCount { expected: usize, got: usize },

    #[error("unknown entry point {0}")]
    UnknownEntryPoint(EntryPointId),

    #[error("vehicle {vehicle} is already parked on ticket {ticket}")]
    AlreadyParked { vehicle: VehicleId, ticket: String },

    #[error("vehicle {0} is not parked")]
    NotParked(VehicleId),

    #[error("no free slot fits a {size} vehicle from entry point {entry}")]
    NoSlotAvailable { size: VehicleSize, entry: EntryPointId },

    #[error("vehicle {vehicle} entering at {entry} before its last exit at {last_exit}")]
    EntryBeforeLastExit { vehicle: VehicleId, entry: DateTime<Utc>, last_exit: DateTime<Utc> },

    #[error("vehicle {0} has no closed tickets")]
    NoClosedTickets(VehicleId),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Fee(#[from] FeeError),
}

impl FacilityError {
    /// Short snake_case label used for logs and rejection counters
    pub fn reason(&self) -> &'static str {
        match self {
            FacilityError::EmptyLayout => "empty_layout",
            FacilityError::TooFewEntryPoints { .. } => "too_few_entry_points",
            FacilityError::RaggedDistances { .. } => "ragged_distances",
            FacilityError::EntryDistanceCount { .. } => "entry_distance_count",
            FacilityError::UnknownEntryPoint(_) => "unknown_entry_point",
            FacilityError::AlreadyParked { .. } => "already_parked",
            FacilityError::NotParked(_) => "not_parked",
            FacilityError::NoSlotAvailable { .. } => "no_slot_available",
            FacilityError::EntryBeforeLastExit { .. } => "entry_before_last_exit",
            FacilityError::NoClosedTickets(_) => "no_closed_tickets",
            FacilityError::Session(_) => "invalid_session",
            FacilityError::Fee(_) => "fee_error",
        }
    }
}

/// What the driver pays when leaving
#[derive(Debug, Clone)]
pub struct Receipt {
    /// The closed ticket, with `fee` and `charged` filled in
    pub session: ParkingSession,
    /// Standalone price of this ticket
    pub fee: u64,
    /// Continuous price of the chain of tickets ending here
    pub segment_total: u64,
    /// Collected earlier in the same chain
    pub previously_charged: u64,
    /// Amount due now
    pub charged: u64,
    /// Number of tickets in the chain, this one included
    pub chain_len: usize,
}

impl Receipt {
    pub fn is_continuation(&self) -> bool {
        self.chain_len > 1
    }
}

/// Continuous-rate view of a vehicle's whole closed history
#[derive(Debug, Clone)]
pub struct Audit {
    pub vehicle: VehicleId,
    pub segments: Vec<SegmentFee>,
    /// Sum of segment fees
    pub total: u64,
    /// Sum of what was actually collected at each unpark
    pub charged: u64,
}

impl Audit {
    /// True when the amounts collected match the continuous pricing
    pub fn is_balanced(&self) -> bool {
        self.total == self.charged
    }
}

pub struct Facility {
    site_id: String,
    slots: Vec<Slot>,
    entry_points: usize,
    engine: FeeEngine,
    store: TicketStore,
    metrics: Option<Arc<Metrics>>,
}

impl Facility {
    /// Build a facility from a slot layout. Every slot must list one distance
    /// per entry point and there must be at least `min_entry_points` of them.
    pub fn new(
        site_id: &str,
        layout: &[SlotSpec],
        min_entry_points: usize,
        schedule: RateSchedule,
    ) -> Result<Self, FacilityError> {
        let first = layout.first().ok_or(FacilityError::EmptyLayout)?;
        let entry_points = first.distances.len();

        for (idx, row) in layout.iter().enumerate() {
            if row.distances.len() != entry_points {
                return Err(FacilityError::RaggedDistances {
                    slot: idx,
                    expected: entry_points,
                    got: row.distances.len(),
                });
            }
        }
        if entry_points < min_entry_points {
            return Err(FacilityError::TooFewEntryPoints { found: entry_points, min: min_entry_points });
        }

        let slots = layout
            .iter()
            .enumerate()
            .map(|(idx, row)| Slot::new(SlotId(idx), row.size, row.distances.clone()))
            .collect();

        Ok(Self {
            site_id: site_id.to_string(),
            slots,
            entry_points,
            engine: FeeEngine::new(schedule),
            store: TicketStore::new(),
            metrics: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FacilityError> {
        Self::new(
            config.site_id(),
            config.slots(),
            config.min_entry_points(),
            config.rate_schedule().clone(),
        )
    }

    /// Record counters into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Open a new entrance. `distances` holds one value per existing slot.
    pub fn add_entry_point(&mut self, distances: Vec<u32>) -> Result<EntryPointId, FacilityError> {
        if distances.len() != self.slots.len() {
            return Err(self.reject(FacilityError::EntryDistanceCount {
                expected: self.slots.len(),
                got: distances.len(),
            }));
        }
        for (slot, distance) in self.slots.iter_mut().zip(distances) {
            slot.distances.push(distance);
        }
        let id = EntryPointId(self.entry_points);
        self.entry_points += 1;
        info!(entry_point = %id, "entry_point_added");
        Ok(id)
    }

    /// Assign the nearest compatible slot and open a ticket
    pub fn park(
        &mut self,
        plate: &str,
        size: VehicleSize,
        entry: EntryPointId,
        at: DateTime<Utc>,
    ) -> Result<ParkingSession, FacilityError> {
        let vehicle = VehicleId::new(plate);

        if entry.0 >= self.entry_points {
            return Err(self.reject(FacilityError::UnknownEntryPoint(entry)));
        }
        if let Some(active) = self.store.active_for(&vehicle) {
            let ticket = active.ticket.clone();
            return Err(self.reject(FacilityError::AlreadyParked { vehicle, ticket }));
        }

        let previous = self.store.last_closed_for(&vehicle).and_then(|last| {
            last.exit_at.map(|exit| (last.ticket.clone(), exit))
        });
        if let Some((_, last_exit)) = &previous {
            if at < *last_exit {
                let last_exit = *last_exit;
                return Err(self.reject(FacilityError::EntryBeforeLastExit { vehicle, entry: at, last_exit }));
            }
        }

        let Some(slot_id) = nearest_slot(&self.slots, entry, size) else {
            return Err(self.reject(FacilityError::NoSlotAvailable { size, entry }));
        };
        let slot_size = self.slots[slot_id.0].size;

        let mut session = ParkingSession::new(vehicle, slot_size, at)
            .with_vehicle_size(size)
            .with_slot(slot_id, entry);

        if let Some((prev_ticket, last_exit)) = previous {
            if self.engine.is_continuous(last_exit, at) {
                session = session.with_previous(&prev_ticket);
                if let Some(ref m) = self.metrics {
                    m.record_continuous_link();
                }
                info!(
                    plate = %session.vehicle,
                    ticket = %session.ticket,
                    previous = %prev_ticket,
                    gap_s = %(at - last_exit).num_seconds(),
                    "continuous_link"
                );
            }
        }

        self.slots[slot_id.0].occupant = Some(session.ticket.clone());
        self.store.insert(session.clone());

        if let Some(ref m) = self.metrics {
            m.record_parked();
        }
        info!(
            plate = %session.vehicle,
            ticket = %session.ticket,
            size = %size,
            slot = %slot_id,
            class = %slot_size,
            entry = %entry,
            "vehicle_parked"
        );

        Ok(session)
    }

    /// Close the vehicle's ticket, free its slot and work out what is due
    pub fn unpark(&mut self, plate: &str, at: DateTime<Utc>) -> Result<Receipt, FacilityError> {
        let vehicle = VehicleId::new(plate);
        let Some(ticket) = self.store.active_for(&vehicle).map(|s| s.ticket.clone()) else {
            return Err(self.reject(FacilityError::NotParked(vehicle)));
        };

        // Priced on a closed copy; the store only changes once every fee is known
        let closed = match self.store.get(&ticket).cloned().map(|s| s.closed_at(at)) {
            Some(Ok(closed)) => closed,
            Some(Err(e)) => return Err(self.reject(e.into())),
            None => return Err(self.reject(FacilityError::NotParked(vehicle))),
        };

        let started = Instant::now();
        let mut chain = self.store.chain_ending_at(&ticket);
        chain.retain(|s| s.ticket != ticket);
        let previously_charged = chain
            .iter()
            .filter_map(|s| s.charged)
            .fold(0u64, |total, charged| total.saturating_add(charged));
        chain.push(&closed);
        let chain_len = chain.len();

        let priced = self.engine.compute_fee(&closed).and_then(|fee| {
            let breakdown = self.engine.continuous_breakdown(&chain)?;
            let segment_total = total_fee(&breakdown)?;
            Ok((fee, breakdown, segment_total))
        });
        let (fee, breakdown, segment_total) = match priced {
            Ok(priced) => priced,
            Err(e) => return Err(self.reject(e.into())),
        };
        let charged = segment_total.saturating_sub(previously_charged);

        if let Some(ref m) = self.metrics {
            m.record_fee_computation(started.elapsed().as_nanos() as u64);
            for segment in &breakdown {
                m.record_segment_hours(segment.billed_hours);
            }
            m.record_unparked(charged);
        }
        if breakdown.len() > 1 {
            // Linked tickets should always form one segment
            warn!(ticket = %ticket, segments = %breakdown.len(), "chain_split");
        }

        let mut session = closed;
        session.fee = Some(fee);
        session.charged = Some(charged);
        if let Some(stored) = self.store.get_mut(&ticket) {
            *stored = session.clone();
        }
        if let Some(slot) = self.slots.get_mut(session.slot.0) {
            slot.occupant = None;
        }

        info!(
            plate = %session.vehicle,
            ticket = %session.ticket,
            slot = %session.slot,
            parked_s = %session.elapsed_seconds().unwrap_or(0),
            fee = %fee,
            segment_total = %segment_total,
            charged = %charged,
            chain_len = %chain_len,
            "vehicle_unparked"
        );

        Ok(Receipt { session, fee, segment_total, previously_charged, charged, chain_len })
    }

    /// Every ticket of a vehicle in issue order
    pub fn history(&self, plate: &str) -> Vec<&ParkingSession> {
        self.store.history(&VehicleId::new(plate))
    }

    /// Re-price a vehicle's closed history under the continuous-rate rule
    pub fn audit(&self, plate: &str) -> Result<Audit, FacilityError> {
        let vehicle = VehicleId::new(plate);
        let closed = self.store.closed_history(&vehicle);
        if closed.is_empty() {
            return Err(FacilityError::NoClosedTickets(vehicle));
        }

        let segments = self.engine.continuous_breakdown(&closed)?;
        let total = total_fee(&segments)?;
        let charged = closed.iter().filter_map(|s| s.charged).sum();
        debug!(plate = %vehicle, segments = %segments.len(), total = %total, "audit_computed");

        Ok(Audit { vehicle, segments, total, charged })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn entry_points(&self) -> usize {
        self.entry_points
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    pub fn active_tickets(&self) -> usize {
        self.store.active_count()
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn engine(&self) -> &FeeEngine {
        &self.engine
    }

    pub fn ticket(&self, ticket: &str) -> Option<&ParkingSession> {
        self.store.get(ticket)
    }

    fn reject(&self, err: FacilityError) -> FacilityError {
        if let Some(ref m) = self.metrics {
            m.record_rejection(err.reason());
        }
        warn!(reason = %err.reason(), error = %err, "operation_rejected");
        err
    }
}
