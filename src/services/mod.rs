//! Services - business logic and state management
//!
//! - `facility` - Orchestrator: park, unpark, history, audit
//! - `allocator` - Nearest compatible slot selection
//! - `ticket_store` - In-memory ticket store

pub mod allocator;
pub mod facility;
pub mod ticket_store;

// Re-export commonly used types
pub use allocator::{nearest_slot, Slot};
pub use facility::{Audit, Facility, FacilityError, Receipt};
pub use ticket_store::TicketStore;
