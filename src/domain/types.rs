//! Shared types for the parking facility

use serde::{Deserialize, Serialize};

/// Newtype wrapper for vehicle plates to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(plate: impl Into<String>) -> Self {
        Self(plate.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for slot indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SlotId(pub usize);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for entry point numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntryPointId(pub usize);

impl std::fmt::Display for EntryPointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Size of a parking slot. Doubles as the rate class a session is billed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSize {
    Small,
    Medium,
    Large,
}

/// Rate classes are slot sizes; the alias keeps billing code readable.
pub type RateClass = SlotSize;

impl SlotSize {
    pub const ALL: [SlotSize; 3] = [SlotSize::Small, SlotSize::Medium, SlotSize::Large];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotSize::Small => "small",
            SlotSize::Medium => "medium",
            SlotSize::Large => "large",
        }
    }

    /// Short code used in the slot map
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            SlotSize::Small => "SP",
            SlotSize::Medium => "MP",
            SlotSize::Large => "LP",
        }
    }

    /// Whether a vehicle of the given size can be parked in a slot of this size
    #[inline]
    pub fn accepts(&self, vehicle: VehicleSize) -> bool {
        self.rank() >= vehicle.rank()
    }

    #[inline]
    fn rank(&self) -> u8 {
        match self {
            SlotSize::Small => 0,
            SlotSize::Medium => 1,
            SlotSize::Large => 2,
        }
    }
}

impl std::fmt::Display for SlotSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size category of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleSize {
    Small,
    Medium,
    Large,
}

impl VehicleSize {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleSize::Small => "small",
            VehicleSize::Medium => "medium",
            VehicleSize::Large => "large",
        }
    }

    #[inline]
    fn rank(&self) -> u8 {
        match self {
            VehicleSize::Small => 0,
            VehicleSize::Medium => 1,
            VehicleSize::Large => 2,
        }
    }
}

impl std::fmt::Display for VehicleSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a size label cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size '{0}' (expected S, M or L)")]
pub struct UnknownSize(pub String);

fn parse_rank(s: &str) -> Option<u8> {
    match s.to_ascii_lowercase().as_str() {
        "s" | "small" | "sp" => Some(0),
        "m" | "medium" | "mp" => Some(1),
        "l" | "large" | "lp" => Some(2),
        _ => None,
    }
}

impl std::str::FromStr for VehicleSize {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_rank(s) {
            Some(0) => Ok(VehicleSize::Small),
            Some(1) => Ok(VehicleSize::Medium),
            Some(2) => Ok(VehicleSize::Large),
            _ => Err(UnknownSize(s.to_string())),
        }
    }
}

impl std::str::FromStr for SlotSize {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_rank(s) {
            Some(0) => Ok(SlotSize::Small),
            Some(1) => Ok(SlotSize::Medium),
            Some(2) => Ok(SlotSize::Large),
            _ => Err(UnknownSize(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_table() {
        assert!(SlotSize::Small.accepts(VehicleSize::Small));
        assert!(!SlotSize::Small.accepts(VehicleSize::Medium));
        assert!(!SlotSize::Small.accepts(VehicleSize::Large));

        assert!(SlotSize::Medium.accepts(VehicleSize::Small));
        assert!(SlotSize::Medium.accepts(VehicleSize::Medium));
        assert!(!SlotSize::Medium.accepts(VehicleSize::Large));

        assert!(SlotSize::Large.accepts(VehicleSize::Small));
        assert!(SlotSize::Large.accepts(VehicleSize::Medium));
        assert!(SlotSize::Large.accepts(VehicleSize::Large));
    }

    #[test]
    fn test_parse_sizes() {
        assert_eq!("S".parse::<VehicleSize>().unwrap(), VehicleSize::Small);
        assert_eq!("medium".parse::<VehicleSize>().unwrap(), VehicleSize::Medium);
        assert_eq!("LP".parse::<SlotSize>().unwrap(), SlotSize::Large);
        assert!("XL".parse::<VehicleSize>().is_err());
    }

    #[test]
    fn test_slot_size_serde_lowercase() {
        let json = serde_json::to_string(&SlotSize::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let parsed: SlotSize = serde_json::from_str("\"large\"").unwrap();
        assert_eq!(parsed, SlotSize::Large);
    }

    #[test]
    fn test_vehicle_id_display() {
        let id = VehicleId::new("ABC-123");
        assert_eq!(id.to_string(), "ABC-123");
        assert_eq!(id.as_str(), "ABC-123");
    }
}
