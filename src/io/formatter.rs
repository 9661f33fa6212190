//! Plain-text rendering of tickets, receipts, audits and the slot map

use crate::domain::session::ParkingSession;
use crate::services::allocator::Slot;
use crate::services::facility::{Audit, Receipt};
use std::fmt::Write;

pub const HELP: &str = "\
commands:
  park <plate> <size> <entry> <rfc3339>   size is S, M or L; entry is 0-based
  unpark <plate> <rfc3339>                close the ticket and print the receipt
  add-entry <d1,d2,...>                   open an entrance, one distance per slot
  status                                  slot map and occupancy
  history <plate>                         every ticket of a vehicle
  audit <plate>                           continuous-rate re-pricing of a vehicle
  help                                    this text
  quit                                    stop reading commands";

fn short(ticket: &str) -> &str {
    // UUIDv7 tails are the random part; the head is the timestamp
    ticket.get(ticket.len().saturating_sub(8)..).unwrap_or(ticket)
}

pub fn format_ticket(session: &ParkingSession) -> String {
    let mut out = format!(
        "ticket {} {} {} in slot {} ({}) via entry {} at {}",
        short(&session.ticket),
        session.vehicle,
        session.vehicle_size,
        session.slot,
        session.rate_class,
        session.entry_point,
        session.entry_at.to_rfc3339(),
    );
    if let Some(exit) = session.exit_at {
        let _ = write!(out, " until {}", exit.to_rfc3339());
    }
    if let Some(charged) = session.charged {
        let _ = write!(out, " charged {}", charged);
    }
    if let Some(prev) = &session.previous {
        let _ = write!(out, " continues {}", short(prev));
    }
    out
}

pub fn format_receipt(receipt: &Receipt) -> String {
    let session = &receipt.session;
    let mut out = format!(
        "receipt {} {} slot {} ({}) parked {}s fee {}",
        short(&session.ticket),
        session.vehicle,
        session.slot,
        session.rate_class,
        session.elapsed_seconds().unwrap_or(0),
        receipt.fee,
    );
    if receipt.is_continuation() {
        let _ = write!(
            out,
            " | continuous stay of {} tickets: total {} already paid {}",
            receipt.chain_len, receipt.segment_total, receipt.previously_charged
        );
    }
    let _ = write!(out, " | due {}", receipt.charged);
    out
}

pub fn format_history(plate: &str, sessions: &[&ParkingSession]) -> String {
    if sessions.is_empty() {
        return format!("no tickets for {plate}");
    }
    sessions.iter().map(|s| format_ticket(s)).collect::<Vec<_>>().join("\n")
}

pub fn format_audit(audit: &Audit) -> String {
    let mut out = format!("audit {}", audit.vehicle);
    for (i, segment) in audit.segments.iter().enumerate() {
        let _ = write!(
            out,
            "\n  segment {}: {} ticket(s), {}h billed ({} day(s)){} fee {}",
            i + 1,
            segment.tickets.len(),
            segment.billed_hours,
            segment.days,
            if segment.mixed_classes { ", mixed classes," } else { "," },
            segment.fee,
        );
    }
    let _ = write!(out, "\n  total {} charged {}", audit.total, audit.charged);
    if !audit.is_balanced() {
        out.push_str(" (mismatch)");
    }
    out
}

/// One row per slot: id, size code, distance per entry point, occupant
pub fn format_slot_map(slots: &[Slot], entry_points: usize) -> String {
    let free = slots.iter().filter(|s| s.is_free()).count();
    let mut out = format!("{} slot(s), {} free, {} entry point(s)", slots.len(), free, entry_points);
    for slot in slots {
        let distances: Vec<String> = slot.distances.iter().map(u32::to_string).collect();
        let _ = write!(
            out,
            "\n  {:>3} {} [{}] {}",
            slot.id.0,
            slot.size.code(),
            distances.join(","),
            slot.occupant.as_deref().map(short).unwrap_or("-"),
        );
    }
    out
}
