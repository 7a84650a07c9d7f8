use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::CancellationFeeStatus;
use crate::services::payments::PaymentGateway;
use crate::services::validation;

#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("booking {0} not found")]
    NotFound(String),
    #[error("booking {0} has no cancellation fee awaiting resolution")]
    NotPending(String),
    #[error("booking {0} has no payment method on file")]
    NoPaymentMethod(String),
    #[error("cancellation fee capture failed: {0}")]
    CaptureFailed(#[source] anyhow::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Successful capture: the processor's reference and the amount taken.
#[derive(Debug, Clone, Serialize)]
pub struct FeeCharge {
    pub booking_id: String,
    pub gateway_ref: String,
    pub amount_cents: i64,
}

/// Pure fee classifier. A fee is owed only when the cancellation lands
/// strictly inside the window before the slot start and a payment method is
/// on file. A cancellation after the start (negative gap) is inside the
/// window; exactly at the boundary is outside.
pub fn assess_cancellation_fee(
    slot_start: NaiveDateTime,
    cancelled_at: NaiveDateTime,
    fee_window_hours: f64,
    has_payment_method: bool,
) -> CancellationFeeStatus {
    let gap_hours = validation::hours_until(slot_start, cancelled_at);
    if has_payment_method && gap_hours < fee_window_hours {
        CancellationFeeStatus::Pending
    } else {
        CancellationFeeStatus::NotApplicable
    }
}

/// Waives a pending fee. No monetary effect.
pub fn dismiss_fee(conn: &Connection, booking_id: &str) -> Result<(), FeeError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| FeeError::NotFound(booking_id.to_string()))?;

    if booking.cancellation_fee_status != CancellationFeeStatus::Pending {
        return Err(FeeError::NotPending(booking_id.to_string()));
    }

    let moved = queries::transition_fee_status(
        conn,
        booking_id,
        CancellationFeeStatus::Pending,
        CancellationFeeStatus::Dismissed,
    )?;
    if !moved {
        // Another resolver won between our read and this write.
        return Err(FeeError::NotPending(booking_id.to_string()));
    }

    tracing::info!("dismissed cancellation fee for booking {booking_id}");
    Ok(())
}

/// Charges a pending fee through the payment gateway. The row moves
/// `pending -> charged` before the gateway is invoked, so a concurrent
/// attempt finds nothing to claim; a failed capture releases the claim back
/// to `pending` for a later retry.
pub fn charge_fee(
    conn: &Connection,
    booking_id: &str,
    gateway: &dyn PaymentGateway,
    amount_cents: i64,
) -> Result<FeeCharge, FeeError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| FeeError::NotFound(booking_id.to_string()))?;

    let Some(payment_method_ref) = booking.payment_method_ref.as_deref() else {
        return Err(FeeError::NoPaymentMethod(booking_id.to_string()));
    };

    let claimed = queries::transition_fee_status(
        conn,
        booking_id,
        CancellationFeeStatus::Pending,
        CancellationFeeStatus::Charged,
    )?;
    if !claimed {
        return Err(FeeError::NotPending(booking_id.to_string()));
    }

    match gateway.capture(booking_id, payment_method_ref, amount_cents) {
        Ok(gateway_ref) => {
            tracing::info!(
                "charged {amount_cents} cent cancellation fee for booking {booking_id} ({gateway_ref})"
            );
            Ok(FeeCharge {
                booking_id: booking_id.to_string(),
                gateway_ref,
                amount_cents,
            })
        }
        Err(e) => {
            match queries::transition_fee_status(
                conn,
                booking_id,
                CancellationFeeStatus::Charged,
                CancellationFeeStatus::Pending,
            ) {
                Ok(true) => {}
                Ok(false) => tracing::error!(
                    "fee claim for booking {booking_id} was already moved after a failed capture"
                ),
                Err(release_err) => tracing::error!(
                    "failed to release fee claim for booking {booking_id}: {release_err:#}"
                ),
            }
            Err(FeeError::CaptureFailed(e))
        }
    }
}
