use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use cleanbook::config::BookingPolicy;
use cleanbook::db;
use cleanbook::models::{BookingStatus, CancellationFeeStatus};
use cleanbook::services::bookings::{self, BookingError, NewBooking};
use cleanbook::services::cancellation::{self, FeeError};
use cleanbook::services::capacity;
use cleanbook::services::payments::PaymentGateway;

// ── Mock Gateway ──

struct MockGateway {
    captures: Arc<Mutex<Vec<(String, String, i64)>>>,
    fail: bool,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            captures: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl PaymentGateway for MockGateway {
    fn capture(
        &self,
        booking_id: &str,
        payment_method_ref: &str,
        amount_cents: i64,
    ) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("card declined");
        }
        let mut captures = self.captures.lock().unwrap();
        captures.push((
            booking_id.to_string(),
            payment_method_ref.to_string(),
            amount_cents,
        ));
        Ok(format!("ch_{}", captures.len()))
    }
}

// ── Helpers ──

fn setup() -> Connection {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    db::init_db(":memory:").unwrap()
}

/// Tuesday morning, well before any of the day's slots.
fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 10)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn request(date: NaiveDate, slot: &str, payment_method: Option<&str>) -> NewBooking {
    NewBooking {
        customer_name: "Maria Lopez".to_string(),
        service_type: "deep".to_string(),
        property_size: "3bed-2bath".to_string(),
        scheduled_date: date,
        time_slot: slot.to_string(),
        payment_method_ref: payment_method.map(str::to_string),
        notes: Some("gate code 4417".to_string()),
    }
}

// ── Booking Flow ──

#[test]
fn test_booking_lifecycle_request_confirm_cancel() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(17), "9:00 AM - 11:00 AM", Some("pm_abc")),
        &policy,
        fixed_now(),
    )
    .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    // Operator confirms through the plain status write.
    assert!(db::queries::update_booking_status(&conn, &booking.id, BookingStatus::Confirmed).unwrap());

    // A week out, cancelling owes nothing.
    let cancelled = bookings::cancel_booking(&conn, &booking.id, &policy, fixed_now()).unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_fee_status,
        CancellationFeeStatus::NotApplicable
    );
    assert_eq!(cancelled.cancelled_at, Some(fixed_now()));
}

#[test]
fn test_slot_fills_then_frees_on_cancellation() {
    let conn = setup();
    let policy = BookingPolicy::default();
    let slot = "1:00 PM - 3:00 PM";

    let mut ids = vec![];
    for _ in 0..3 {
        let b =
            bookings::request_booking(&conn, request(day(17), slot, None), &policy, fixed_now())
                .unwrap();
        ids.push(b.id);
    }

    let err =
        bookings::request_booking(&conn, request(day(17), slot, None), &policy, fixed_now())
            .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable(_)));
    assert!(err.to_string().contains("3/3"));

    let summary =
        capacity::get_available_slots(&conn, day(17), policy.max_per_slot, &policy.day_slots)
            .unwrap();
    let entry = summary.iter().find(|s| s.slot == slot).unwrap();
    assert_eq!(entry.available, 0);
    assert_eq!(entry.total, 3);

    // Cancelling one opens the slot again.
    bookings::cancel_booking(&conn, &ids[0], &policy, fixed_now()).unwrap();
    bookings::request_booking(&conn, request(day(17), slot, None), &policy, fixed_now()).unwrap();
}

#[test]
fn test_day_listing_in_creation_order() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let first = bookings::request_booking(
        &conn,
        request(day(17), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();
    let five_past = day(10).and_hms_opt(8, 5, 0).unwrap();
    let second = bookings::request_booking(
        &conn,
        request(day(17), "3:00 PM - 5:00 PM", None),
        &policy,
        five_past,
    )
    .unwrap();
    // Different date, must not appear in the listing.
    bookings::request_booking(
        &conn,
        request(day(18), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let listed = db::queries::get_bookings_for_date(&conn, day(17)).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
    assert_eq!(listed[0].notes.as_deref(), Some("gate code 4417"));
}

#[test]
fn test_reschedule_moves_occupancy() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(17), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let moved = bookings::reschedule_booking(
        &conn,
        &booking.id,
        day(18),
        "3:00 PM - 5:00 PM",
        &policy,
        fixed_now(),
    )
    .unwrap();
    assert_eq!(moved.scheduled_date, day(18));
    assert_eq!(moved.time_slot, "3:00 PM - 5:00 PM");

    let old_day =
        capacity::get_available_slots(&conn, day(17), policy.max_per_slot, &policy.day_slots)
            .unwrap();
    assert_eq!(old_day[0].available, 3);

    let new_day =
        capacity::get_available_slots(&conn, day(18), policy.max_per_slot, &policy.day_slots)
            .unwrap();
    let entry = new_day.iter().find(|s| s.slot == "3:00 PM - 5:00 PM").unwrap();
    assert_eq!(entry.available, 2);
}

#[test]
fn test_reschedule_enforces_notice_on_new_slot() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(17), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    // Same-day 1:00 PM is five hours away, under the 12-hour minimum.
    let err = bookings::reschedule_booking(
        &conn,
        &booking.id,
        day(10),
        "1:00 PM - 3:00 PM",
        &policy,
        fixed_now(),
    )
    .unwrap_err();
    assert!(
        err.to_string().contains("notice"),
        "expected a lead-time rejection, got: {err}"
    );

    // The booking did not move.
    let stored = db::queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
    assert_eq!(stored.scheduled_date, day(17));
}

// ── Cancellation Fees ──

#[test]
fn test_late_cancellation_charges_stored_method() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(11), "9:00 AM - 11:00 AM", Some("pm_visa_1")),
        &policy,
        fixed_now(),
    )
    .unwrap();

    // 10:00 PM the night before: 11 hours out, inside the 24-hour window.
    let late = day(10).and_hms_opt(22, 0, 0).unwrap();
    let cancelled = bookings::cancel_booking(&conn, &booking.id, &policy, late).unwrap();
    assert_eq!(
        cancelled.cancellation_fee_status,
        CancellationFeeStatus::Pending
    );

    let gateway = MockGateway::new();
    let charge =
        cancellation::charge_fee(&conn, &booking.id, &gateway, policy.cancellation_fee_cents)
            .unwrap();
    assert_eq!(charge.amount_cents, 3500);

    let captures = gateway.captures.lock().unwrap();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].1, "pm_visa_1");
    assert_eq!(captures[0].2, 3500);

    let stored = db::queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
    assert_eq!(
        stored.cancellation_fee_status,
        CancellationFeeStatus::Charged
    );
}

#[test]
fn test_dismissed_fee_is_never_charged() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(11), "9:00 AM - 11:00 AM", Some("pm_visa_1")),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let late = day(10).and_hms_opt(22, 0, 0).unwrap();
    bookings::cancel_booking(&conn, &booking.id, &policy, late).unwrap();

    cancellation::dismiss_fee(&conn, &booking.id).unwrap();

    let gateway = MockGateway::new();
    let err =
        cancellation::charge_fee(&conn, &booking.id, &gateway, policy.cancellation_fee_cents)
            .unwrap_err();
    assert!(matches!(err, FeeError::NotPending(_)));
    assert!(gateway.captures.lock().unwrap().is_empty());

    let stored = db::queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
    assert_eq!(
        stored.cancellation_fee_status,
        CancellationFeeStatus::Dismissed
    );
}

#[test]
fn test_declined_capture_keeps_fee_collectable() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(11), "9:00 AM - 11:00 AM", Some("pm_visa_1")),
        &policy,
        fixed_now(),
    )
    .unwrap();
    let late = day(10).and_hms_opt(22, 0, 0).unwrap();
    bookings::cancel_booking(&conn, &booking.id, &policy, late).unwrap();

    let declined = cancellation::charge_fee(
        &conn,
        &booking.id,
        &MockGateway::failing(),
        policy.cancellation_fee_cents,
    );
    assert!(matches!(declined, Err(FeeError::CaptureFailed(_))));

    // Claim was released; a later retry collects.
    let gateway = MockGateway::new();
    cancellation::charge_fee(&conn, &booking.id, &gateway, policy.cancellation_fee_cents)
        .unwrap();
    assert_eq!(gateway.captures.lock().unwrap().len(), 1);
}

#[test]
fn test_cancellation_without_stored_method_owes_nothing() {
    let conn = setup();
    let policy = BookingPolicy::default();

    let booking = bookings::request_booking(
        &conn,
        request(day(11), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let late = day(10).and_hms_opt(22, 0, 0).unwrap();
    let cancelled = bookings::cancel_booking(&conn, &booking.id, &policy, late).unwrap();
    assert_eq!(
        cancelled.cancellation_fee_status,
        CancellationFeeStatus::NotApplicable
    );

    // Nothing pending, so resolution paths refuse.
    assert!(matches!(
        cancellation::dismiss_fee(&conn, &booking.id),
        Err(FeeError::NotPending(_))
    ));
}

// ── Policy Configuration ──

#[test]
fn test_settings_json_drives_admission() {
    let conn = setup();
    // Business settings row: one slot, one crew, short notice.
    let policy = BookingPolicy::from_json(
        r#"{
            "max_per_slot": 1,
            "min_lead_hours": 2.0,
            "day_slots": ["10:00 AM - 12:00 PM"]
        }"#,
    )
    .unwrap();
    assert_eq!(policy.fee_window_hours, 24.0);

    bookings::request_booking(
        &conn,
        request(day(10), "10:00 AM - 12:00 PM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let err = bookings::request_booking(
        &conn,
        request(day(10), "10:00 AM - 12:00 PM", None),
        &policy,
        fixed_now(),
    )
    .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable(_)));
    assert!(err.to_string().contains("1/1"));

    // A slot the settings row does not offer.
    let err = bookings::request_booking(
        &conn,
        request(day(11), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("standard time slots"));
}

#[test]
fn test_day_summary_serializes_for_handlers() {
    let conn = setup();
    let policy = BookingPolicy::default();

    bookings::request_booking(
        &conn,
        request(day(17), "9:00 AM - 11:00 AM", None),
        &policy,
        fixed_now(),
    )
    .unwrap();

    let summary =
        capacity::get_available_slots(&conn, day(17), policy.max_per_slot, &policy.day_slots)
            .unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json[0]["slot"], "9:00 AM - 11:00 AM");
    assert_eq!(json[0]["available"], 2);
    assert_eq!(json[0]["total"], 3);
}
