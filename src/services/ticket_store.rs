//! In-memory ticket store
//!
//! Every ticket ever issued, by ticket id, plus each vehicle's tickets in
//! issue order. Nothing is persisted.

use crate::domain::session::ParkingSession;
use crate::domain::types::VehicleId;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: FxHashMap<String, ParkingSession>,
    by_vehicle: FxHashMap<VehicleId, Vec<String>>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: ParkingSession) {
        self.by_vehicle.entry(session.vehicle.clone()).or_default().push(session.ticket.clone());
        self.tickets.insert(session.ticket.clone(), session);
    }

    pub fn get(&self, ticket: &str) -> Option<&ParkingSession> {
        self.tickets.get(ticket)
    }

    pub fn get_mut(&mut self, ticket: &str) -> Option<&mut ParkingSession> {
        self.tickets.get_mut(ticket)
    }

    /// All tickets of a vehicle in issue order
    pub fn history(&self, vehicle: &VehicleId) -> Vec<&ParkingSession> {
        self.by_vehicle
            .get(vehicle)
            .map(|ids| ids.iter().filter_map(|id| self.tickets.get(id)).collect())
            .unwrap_or_default()
    }

    /// Closed tickets of a vehicle in issue order
    pub fn closed_history(&self, vehicle: &VehicleId) -> Vec<&ParkingSession> {
        self.history(vehicle).into_iter().filter(|s| !s.is_active()).collect()
    }

    /// The vehicle's open ticket, if it is currently parked
    pub fn active_for(&self, vehicle: &VehicleId) -> Option<&ParkingSession> {
        self.history(vehicle).into_iter().rev().find(|s| s.is_active())
    }

    /// The vehicle's most recently closed ticket
    pub fn last_closed_for(&self, vehicle: &VehicleId) -> Option<&ParkingSession> {
        self.history(vehicle).into_iter().rev().find(|s| !s.is_active())
    }

    /// Follow previous-ticket links back from `ticket`; oldest first
    pub fn chain_ending_at(&self, ticket: &str) -> Vec<&ParkingSession> {
        let mut chain = Vec::new();
        let mut cursor = self.tickets.get(ticket);
        while let Some(session) = cursor {
            chain.push(session);
            cursor = session.previous.as_deref().and_then(|prev| self.tickets.get(prev));
        }
        chain.reverse();
        chain
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.tickets.values().filter(|s| s.is_active()).count()
    }
}
