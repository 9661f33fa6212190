//! Parking session (ticket) data model

use crate::domain::types::{EntryPointId, RateClass, SlotId, VehicleId, VehicleSize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Vehicle is still in the slot (no exit instant)
    Active,
    /// Exit instant recorded; terminal
    Closed,
}

impl SessionState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        }
    }
}

/// Errors raised while transitioning a session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("ticket {0} is already closed")]
    AlreadyClosed(String),

    #[error("exit {exit} precedes entry {entry} on ticket {ticket}")]
    ExitBeforeEntry { ticket: String, entry: DateTime<Utc>, exit: DateTime<Utc> },
}

/// One stay of one vehicle in one slot
#[derive(Debug, Clone)]
pub struct ParkingSession {
    pub ticket: String, // UUIDv7 ticket ID
    pub vehicle: VehicleId,
    pub vehicle_size: VehicleSize,
    pub rate_class: RateClass, // size of the assigned slot, fixed at creation
    pub slot: SlotId,
    pub entry_point: EntryPointId,
    pub entry_at: DateTime<Utc>,
    pub exit_at: Option<DateTime<Utc>>,
    pub previous: Option<String>, // ticket of the continuous predecessor, if any
    pub fee: Option<u64>,         // standalone fee, set on close
    pub charged: Option<u64>,     // amount actually collected on close
}

impl ParkingSession {
    /// Create an active session billed under `rate_class`.
    ///
    /// The vehicle size defaults to the largest size the class accepts and the
    /// slot/entry point to zero; the orchestrator overrides both through the
    /// builder methods.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use parking_facility::domain::session::ParkingSession;
    /// use parking_facility::domain::types::{SlotSize, VehicleId};
    ///
    /// let entry = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    /// let session = ParkingSession::new(VehicleId::new("ABC-123"), SlotSize::Small, entry);
    /// assert!(session.is_active());
    /// ```
    pub fn new(vehicle: VehicleId, rate_class: RateClass, entry_at: DateTime<Utc>) -> Self {
        let vehicle_size = match rate_class {
            RateClass::Small => VehicleSize::Small,
            RateClass::Medium => VehicleSize::Medium,
            RateClass::Large => VehicleSize::Large,
        };
        Self {
            ticket: new_uuid_v7(),
            vehicle,
            vehicle_size,
            rate_class,
            slot: SlotId(0),
            entry_point: EntryPointId(0),
            entry_at,
            exit_at: None,
            previous: None,
            fee: None,
            charged: None,
        }
    }

    pub fn with_slot(mut self, slot: SlotId, entry_point: EntryPointId) -> Self {
        self.slot = slot;
        self.entry_point = entry_point;
        self
    }

    pub fn with_vehicle_size(mut self, size: VehicleSize) -> Self {
        self.vehicle_size = size;
        self
    }

    pub fn with_previous(mut self, ticket: &str) -> Self {
        self.previous = Some(ticket.to_string());
        self
    }

    /// Record the exit instant. A session can be closed once.
    pub fn close(&mut self, exit_at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.exit_at.is_some() {
            return Err(SessionError::AlreadyClosed(self.ticket.clone()));
        }
        if exit_at < self.entry_at {
            return Err(SessionError::ExitBeforeEntry {
                ticket: self.ticket.clone(),
                entry: self.entry_at,
                exit: exit_at,
            });
        }
        self.exit_at = Some(exit_at);
        Ok(())
    }

    /// Builder-style close, mostly for tests and audits of historic data
    pub fn closed_at(mut self, exit_at: DateTime<Utc>) -> Result<Self, SessionError> {
        self.close(exit_at)?;
        Ok(self)
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        if self.exit_at.is_some() {
            SessionState::Closed
        } else {
            SessionState::Active
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.exit_at.is_none()
    }

    /// Whole seconds parked, or None while active
    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.exit_at.map(|exit| (exit - self.entry_at).num_seconds())
    }

    /// Convert to JSON string with site_id included
    pub fn to_json_with_site(&self, site_id: &str) -> String {
        serde_json::Value::Object(self.to_json_map(site_id)).to_string()
    }

    /// JSON fields of the ticket, for callers that add their own
    pub fn to_json_map(&self, site_id: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut obj = serde_json::Map::new();
        obj.insert("site".to_string(), serde_json::Value::String(site_id.to_string()));
        obj.insert("ticket".to_string(), serde_json::Value::String(self.ticket.clone()));
        obj.insert("plate".to_string(), serde_json::Value::String(self.vehicle.0.clone()));
        obj.insert("vehicle".to_string(), serde_json::json!(self.vehicle_size.as_str()));
        obj.insert("class".to_string(), serde_json::json!(self.rate_class.as_str()));
        obj.insert("slot".to_string(), serde_json::json!(self.slot.0));
        obj.insert("entry".to_string(), serde_json::json!(self.entry_point.0));
        obj.insert("t0".to_string(), serde_json::Value::String(self.entry_at.to_rfc3339()));
        if let Some(exit) = self.exit_at {
            obj.insert("t1".to_string(), serde_json::Value::String(exit.to_rfc3339()));
        }
        match &self.previous {
            Some(prev) => obj.insert("prev".to_string(), serde_json::Value::String(prev.clone())),
            None => obj.insert("prev".to_string(), serde_json::Value::Null),
        };
        if let Some(fee) = self.fee {
            obj.insert("fee".to_string(), serde_json::Value::Number(fee.into()));
        }
        if let Some(charged) = self.charged {
            obj.insert("charged".to_string(), serde_json::Value::Number(charged.into()));
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SlotSize;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_session_is_active() {
        let session = ParkingSession::new(VehicleId::new("AAA"), SlotSize::Medium, t0());

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.vehicle_size, VehicleSize::Medium);
        assert!(session.exit_at.is_none());
        assert!(session.elapsed_seconds().is_none());
        assert_eq!(session.ticket.len(), 36);
    }

    #[test]
    fn test_close_sets_exit() {
        let mut session = ParkingSession::new(VehicleId::new("AAA"), SlotSize::Small, t0());
        session.close(t0() + Duration::minutes(90)).unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.elapsed_seconds(), Some(5400));
    }

    #[test]
    fn test_close_twice_rejected() {
        let mut session = ParkingSession::new(VehicleId::new("AAA"), SlotSize::Small, t0());
        session.close(t0() + Duration::hours(1)).unwrap();

        let err = session.close(t0() + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyClosed(_)));
        assert_eq!(session.exit_at, Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_exit_before_entry_rejected() {
        let mut session = ParkingSession::new(VehicleId::new("AAA"), SlotSize::Small, t0());
        let err = session.close(t0() - Duration::seconds(1)).unwrap_err();

        assert!(matches!(err, SessionError::ExitBeforeEntry { .. }));
        assert!(session.is_active());
    }

    #[test]
    fn test_zero_length_close_allowed() {
        let session =
            ParkingSession::new(VehicleId::new("AAA"), SlotSize::Large, t0()).closed_at(t0());
        assert_eq!(session.unwrap().elapsed_seconds(), Some(0));
    }

    #[test]
    fn test_session_to_json() {
        let mut session = ParkingSession::new(VehicleId::new("XYZ-9"), SlotSize::Large, t0())
            .with_slot(SlotId(4), EntryPointId(2))
            .with_vehicle_size(VehicleSize::Medium)
            .with_previous("prev-ticket");
        session.close(t0() + Duration::hours(2)).unwrap();
        session.fee = Some(40);
        session.charged = Some(0);

        let parsed: serde_json::Value =
            serde_json::from_str(&session.to_json_with_site("mall")).unwrap();

        assert_eq!(parsed["site"], "mall");
        assert_eq!(parsed["plate"], "XYZ-9");
        assert_eq!(parsed["vehicle"], "medium");
        assert_eq!(parsed["class"], "large");
        assert_eq!(parsed["slot"], 4);
        assert_eq!(parsed["entry"], 2);
        assert_eq!(parsed["prev"], "prev-ticket");
        assert_eq!(parsed["fee"], 40);
        assert_eq!(parsed["charged"], 0);
        assert!(parsed["t1"].is_string());
    }
}
