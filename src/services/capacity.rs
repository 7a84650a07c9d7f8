use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{SlotAvailability, SlotCapacity};

/// Occupancy gate for one (date, slot). A store failure never grants
/// capacity: when the count cannot be read the slot reports as unavailable
/// with its own reason.
pub fn check_slot_capacity(
    conn: &Connection,
    date: NaiveDate,
    slot_label: &str,
    max_per_slot: i64,
    exclude_booking_id: Option<&str>,
) -> SlotCapacity {
    match queries::count_slot_bookings(conn, date, slot_label, exclude_booking_id) {
        Ok(count) if count < max_per_slot => SlotCapacity::open(count, max_per_slot),
        Ok(count) => SlotCapacity::full(count, max_per_slot),
        Err(e) => {
            tracing::error!("failed to count bookings for {date} '{slot_label}': {e:#}");
            SlotCapacity::unverified(max_per_slot)
        }
    }
}

/// Remaining capacity for every canonical slot on one date, in the order the
/// slot list gives them. `available` is plain `max - booked` and goes
/// negative when the ceiling was lowered under existing bookings; callers
/// clamp for display.
pub fn get_available_slots(
    conn: &Connection,
    date: NaiveDate,
    max_per_slot: i64,
    day_slots: &[String],
) -> anyhow::Result<Vec<SlotAvailability>> {
    let counts = queries::count_bookings_by_slot(conn, date)?;

    Ok(day_slots
        .iter()
        .map(|slot| {
            let booked = counts.get(slot).copied().unwrap_or(0);
            SlotAvailability {
                slot: slot.clone(),
                available: max_per_slot - booked,
                total: max_per_slot,
            }
        })
        .collect())
}
