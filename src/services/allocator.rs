//! Slot layout and nearest-slot allocation
//!
//! Each slot stores its distance from every entry point. A vehicle entering
//! through an entry point gets the closest free slot it fits in.

use crate::domain::types::{EntryPointId, SlotId, SlotSize, VehicleSize};

/// A parking slot and its current occupant
#[derive(Debug, Clone)]
pub struct Slot {
    pub id: SlotId,
    pub size: SlotSize,
    /// Distance to each entry point, indexed by entry point number
    pub distances: Vec<u32>,
    /// Ticket of the session currently occupying the slot
    pub occupant: Option<String>,
}

impl Slot {
    pub fn new(id: SlotId, size: SlotSize, distances: Vec<u32>) -> Self {
        Self { id, size, distances, occupant: None }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    #[inline]
    pub fn distance_from(&self, entry: EntryPointId) -> Option<u32> {
        self.distances.get(entry.0).copied()
    }
}

/// Pick the free, compatible slot closest to `entry`.
///
/// Ties on distance go to the lowest slot id. Returns None when nothing fits.
pub fn nearest_slot(slots: &[Slot], entry: EntryPointId, vehicle: VehicleSize) -> Option<SlotId> {
    slots
        .iter()
        .filter(|slot| slot.is_free() && slot.size.accepts(vehicle))
        .filter_map(|slot| slot.distance_from(entry).map(|d| (d, slot.id)))
        .min()
        .map(|(_, id)| id)
}
