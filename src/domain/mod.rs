//! Domain models - core business types and the parking session model
//!
//! This module contains the canonical data types used throughout the system:
//! - `ParkingSession` - one stay of one vehicle in one slot (the ticket)
//! - `SlotSize` / `RateClass` - slot category, also the billing class
//! - `VehicleSize` - vehicle category, matched against slots by compatibility
//! - `VehicleId`, `SlotId`, `EntryPointId` - identifier newtypes

pub mod session;
pub mod types;

// Re-export commonly used types at module level
pub use session::{ParkingSession, SessionError, SessionState};
pub use types::{EntryPointId, RateClass, SlotId, SlotSize, VehicleId, VehicleSize};
