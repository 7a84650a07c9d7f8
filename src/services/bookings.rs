use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::BookingPolicy;
use crate::db::queries;
use crate::models::{Booking, BookingStatus, CancellationFeeStatus, SlotValidity};
use crate::services::{cancellation, capacity, slots, validation};

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub customer_name: String,
    pub service_type: String,
    pub property_size: String,
    pub scheduled_date: NaiveDate,
    pub time_slot: String,
    #[serde(default)]
    pub payment_method_ref: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    SlotUnavailable(String),
    #[error("booking {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn rejection(validity: SlotValidity) -> BookingError {
    BookingError::Rejected(
        validity
            .reason
            .unwrap_or_else(|| "This booking cannot be scheduled.".to_string()),
    )
}

/// Admission gauntlet shared by request and reschedule: the label must be a
/// slot the business offers, the start must be in the future with enough
/// notice, and the slot must have room. The capacity snapshot is re-read on
/// every call; two requests racing for the last opening can both pass, and
/// callers needing strict serialization wrap the flow in a transaction on
/// their shared connection.
fn admit_slot(
    conn: &Connection,
    date: NaiveDate,
    slot_label: &str,
    policy: &BookingPolicy,
    exclude_booking_id: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), BookingError> {
    if !policy.day_slots.iter().any(|s| s == slot_label) {
        return Err(BookingError::Rejected(
            "That time slot isn't one we offer. Please choose one of our standard time slots."
                .to_string(),
        ));
    }

    let not_past = validation::validate_not_past(date, slot_label, now);
    if !not_past.valid {
        return Err(rejection(not_past));
    }

    let lead = validation::validate_lead_time(date, slot_label, policy.min_lead_hours, now);
    if !lead.valid {
        return Err(rejection(lead));
    }

    let slot_capacity =
        capacity::check_slot_capacity(conn, date, slot_label, policy.max_per_slot, exclude_booking_id);
    if !slot_capacity.available {
        return Err(BookingError::SlotUnavailable(
            slot_capacity
                .reason
                .unwrap_or_else(|| "This time slot is unavailable.".to_string()),
        ));
    }

    Ok(())
}

/// Takes a new booking through the admission gauntlet and persists it as
/// `pending`.
pub fn request_booking(
    conn: &Connection,
    new_booking: NewBooking,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> Result<Booking, BookingError> {
    admit_slot(
        conn,
        new_booking.scheduled_date,
        &new_booking.time_slot,
        policy,
        None,
        now,
    )?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        customer_name: new_booking.customer_name,
        service_type: new_booking.service_type,
        property_size: new_booking.property_size,
        scheduled_date: new_booking.scheduled_date,
        time_slot: new_booking.time_slot,
        status: BookingStatus::Pending,
        cancellation_fee_status: CancellationFeeStatus::NotApplicable,
        cancelled_at: None,
        payment_method_ref: new_booking.payment_method_ref,
        notes: new_booking.notes,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(conn, &booking)?;

    tracing::info!(
        "created booking {} for {} '{}'",
        booking.id,
        booking.scheduled_date,
        booking.time_slot
    );
    Ok(booking)
}

/// Moves an open booking to a new (date, slot). The booking being moved is
/// excluded from the capacity count so it never blocks itself.
pub fn reschedule_booking(
    conn: &Connection,
    booking_id: &str,
    new_date: NaiveDate,
    new_slot: &str,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> Result<Booking, BookingError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| BookingError::NotFound(booking_id.to_string()))?;

    if !booking.status.is_open() {
        return Err(BookingError::Rejected(
            "This booking is no longer active and cannot be rescheduled.".to_string(),
        ));
    }

    admit_slot(conn, new_date, new_slot, policy, Some(booking_id), now)?;

    let moved = queries::update_booking_schedule(conn, booking_id, new_date, new_slot)?;
    if !moved {
        return Err(BookingError::Rejected(
            "This booking is no longer active and cannot be rescheduled.".to_string(),
        ));
    }

    tracing::info!("rescheduled booking {booking_id} to {new_date} '{new_slot}'");
    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| BookingError::NotFound(booking_id.to_string()))
}

/// Cancels an open booking, classifying the cancellation fee from the gap
/// between now and the slot start. A stored label that no longer parses
/// waives the fee: the business does not charge on timing it cannot
/// establish.
pub fn cancel_booking(
    conn: &Connection,
    booking_id: &str,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> Result<Booking, BookingError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| BookingError::NotFound(booking_id.to_string()))?;

    if !booking.status.is_open() {
        return Err(BookingError::Rejected(
            "This booking is no longer active and cannot be cancelled.".to_string(),
        ));
    }

    let fee_status = match slots::parse_slot_start(booking.scheduled_date, &booking.time_slot) {
        Ok(start) => cancellation::assess_cancellation_fee(
            start,
            now,
            policy.fee_window_hours,
            booking.payment_method_ref.is_some(),
        ),
        Err(e) => {
            tracing::warn!(
                "booking {booking_id} has an unreadable slot label, waiving cancellation fee: {e}"
            );
            CancellationFeeStatus::NotApplicable
        }
    };

    let cancelled = queries::mark_cancelled(conn, booking_id, fee_status, now)?;
    if !cancelled {
        return Err(BookingError::Rejected(
            "This booking is no longer active and cannot be cancelled.".to_string(),
        ));
    }

    match fee_status {
        CancellationFeeStatus::Pending => tracing::info!(
            "cancelled booking {booking_id} inside the fee window, {} cent fee pending",
            policy.cancellation_fee_cents
        ),
        _ => tracing::info!("cancelled booking {booking_id} with no fee"),
    }

    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| BookingError::NotFound(booking_id.to_string()))
}
