use chrono::{NaiveDate, NaiveDateTime};

use crate::models::SlotValidity;
use crate::services::slots;

const BAD_FORMAT_REASON: &str = "Invalid date or time format.";

/// Signed hours from `now` to `start`. Negative once the start has passed.
pub fn hours_until(start: NaiveDateTime, now: NaiveDateTime) -> f64 {
    (start - now).num_seconds() as f64 / 3600.0
}

/// The requested slot must start strictly later than `now`.
pub fn validate_not_past(date: NaiveDate, slot_label: &str, now: NaiveDateTime) -> SlotValidity {
    let start = match slots::parse_slot_start(date, slot_label) {
        Ok(start) => start,
        Err(_) => return SlotValidity::rejected(BAD_FORMAT_REASON),
    };

    if start > now {
        SlotValidity::ok()
    } else {
        SlotValidity::rejected(
            "That date and time has already passed. Please choose an upcoming slot.",
        )
    }
}

/// Minimum notice between the request and the slot start, in fractional
/// hours. The boundary passes: exactly 12 hours ahead satisfies a 12-hour
/// minimum.
pub fn validate_lead_time(
    date: NaiveDate,
    slot_label: &str,
    min_lead_hours: f64,
    now: NaiveDateTime,
) -> SlotValidity {
    let start = match slots::parse_slot_start(date, slot_label) {
        Ok(start) => start,
        Err(_) => return SlotValidity::rejected(BAD_FORMAT_REASON),
    };

    if hours_until(start, now) >= min_lead_hours {
        SlotValidity::ok()
    } else {
        SlotValidity::rejected(format!(
            "We need at least {min_lead_hours} hours notice for bookings. Please choose a later date or time."
        ))
    }
}
