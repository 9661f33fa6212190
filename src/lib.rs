//! Parking facility library
//!
//! Slot allocation, ticketing and the continuous-rate fee engine. Exposes
//! modules for integration testing and binary reuse.

pub mod billing;
pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
