use std::collections::HashMap;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, CancellationFeeStatus};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_name, service_type, property_size, scheduled_date, time_slot, status, cancellation_fee_status, cancelled_at, payment_method_ref, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.customer_name,
            booking.service_type,
            booking.property_size,
            booking.scheduled_date.format(DATE_FMT).to_string(),
            booking.time_slot,
            booking.status.as_str(),
            booking.cancellation_fee_status.as_str(),
            booking.cancelled_at.map(|dt| dt.format(DATETIME_FMT).to_string()),
            booking.payment_method_ref,
            booking.notes,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, customer_name, service_type, property_size, scheduled_date, time_slot, status, cancellation_fee_status, cancelled_at, payment_method_ref, notes, created_at, updated_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_for_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_name, service_type, property_size, scheduled_date, time_slot, status, cancellation_fee_status, cancelled_at, payment_method_ref, notes, created_at, updated_at
         FROM bookings WHERE scheduled_date = ?1 ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Number of bookings occupying a (date, slot) pair. Cancelled and rejected
/// rows never count; `exclude_booking_id` removes the booking being edited
/// from its own count.
pub fn count_slot_bookings(
    conn: &Connection,
    date: NaiveDate,
    slot_label: &str,
    exclude_booking_id: Option<&str>,
) -> anyhow::Result<i64> {
    let date_str = date.format(DATE_FMT).to_string();

    let count: i64 = match exclude_booking_id {
        Some(excluded) => conn.query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE scheduled_date = ?1 AND time_slot = ?2
               AND status NOT IN ('cancelled', 'rejected')
               AND id != ?3",
            params![date_str, slot_label, excluded],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE scheduled_date = ?1 AND time_slot = ?2
               AND status NOT IN ('cancelled', 'rejected')",
            params![date_str, slot_label],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

/// Occupancy per slot label for one date, for the day summary.
pub fn count_bookings_by_slot(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot, COUNT(*) FROM bookings
         WHERE scheduled_date = ?1 AND status NOT IN ('cancelled', 'rejected')
         GROUP BY time_slot",
    )?;

    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
        let (slot, count) = row?;
        counts.insert(slot, count);
    }
    Ok(counts)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = Local::now().naive_local().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Move an open booking to a new (date, slot). Returns false when the row is
/// missing or no longer open.
pub fn update_booking_schedule(
    conn: &Connection,
    id: &str,
    new_date: NaiveDate,
    new_slot: &str,
) -> anyhow::Result<bool> {
    let now = Local::now().naive_local().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET scheduled_date = ?1, time_slot = ?2, updated_at = ?3
         WHERE id = ?4 AND status IN ('pending', 'confirmed')",
        params![new_date.format(DATE_FMT).to_string(), new_slot, now, id],
    )?;
    Ok(count > 0)
}

/// Cancel an open booking, recording the fee assessment and the cancellation
/// instant in the same statement. Returns false when the row is missing or
/// was not open, leaving any previously assessed fee untouched.
pub fn mark_cancelled(
    conn: &Connection,
    id: &str,
    fee_status: CancellationFeeStatus,
    cancelled_at: NaiveDateTime,
) -> anyhow::Result<bool> {
    let cancelled_str = cancelled_at.format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings
         SET status = 'cancelled', cancellation_fee_status = ?1, cancelled_at = ?2, updated_at = ?2
         WHERE id = ?3 AND status IN ('pending', 'confirmed')",
        params![fee_status.as_str(), cancelled_str, id],
    )?;
    Ok(count > 0)
}

/// Single conditional UPDATE guarding the fee state machine: the write only
/// lands if the row still holds `from`, so concurrent resolvers cannot both
/// succeed.
pub fn transition_fee_status(
    conn: &Connection,
    id: &str,
    from: CancellationFeeStatus,
    to: CancellationFeeStatus,
) -> anyhow::Result<bool> {
    let now = Local::now().naive_local().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET cancellation_fee_status = ?1, updated_at = ?2
         WHERE id = ?3 AND cancellation_fee_status = ?4",
        params![to.as_str(), now, id, from.as_str()],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let customer_name: String = row.get(1)?;
    let service_type: String = row.get(2)?;
    let property_size: String = row.get(3)?;
    let scheduled_date_str: String = row.get(4)?;
    let time_slot: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let fee_status_str: String = row.get(7)?;
    let cancelled_at_str: Option<String> = row.get(8)?;
    let payment_method_ref: Option<String> = row.get(9)?;
    let notes: Option<String> = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    let scheduled_date = NaiveDate::parse_from_str(&scheduled_date_str, DATE_FMT)
        .with_context(|| format!("malformed scheduled_date for booking {id}"))?;
    let cancelled_at = cancelled_at_str
        .as_deref()
        .and_then(|s| NaiveDateTime::parse_from_str(s, DATETIME_FMT).ok());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Local::now().naive_local());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Local::now().naive_local());

    Ok(Booking {
        id,
        customer_name,
        service_type,
        property_size,
        scheduled_date,
        time_slot,
        status: BookingStatus::parse(&status_str),
        cancellation_fee_status: CancellationFeeStatus::parse(&fee_status_str),
        cancelled_at,
        payment_method_ref,
        notes,
        created_at,
        updated_at,
    })
}
