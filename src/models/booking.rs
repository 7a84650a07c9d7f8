use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub service_type: String,
    pub property_size: String,
    pub scheduled_date: NaiveDate,
    pub time_slot: String,
    pub status: BookingStatus,
    pub cancellation_fee_status: CancellationFeeStatus,
    pub cancelled_at: Option<NaiveDateTime>,
    pub payment_method_ref: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            "rejected" => BookingStatus::Rejected,
            _ => BookingStatus::Pending,
        }
    }

    /// Cancelled and rejected bookings release their slot.
    pub fn counts_toward_capacity(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Rejected)
    }

    /// Whether the booking is still an upcoming appointment that can be
    /// moved or called off.
    pub fn is_open(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancellationFeeStatus {
    NotApplicable,
    Pending,
    Dismissed,
    Charged,
}

impl CancellationFeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationFeeStatus::NotApplicable => "not_applicable",
            CancellationFeeStatus::Pending => "pending",
            CancellationFeeStatus::Dismissed => "dismissed",
            CancellationFeeStatus::Charged => "charged",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => CancellationFeeStatus::Pending,
            "dismissed" => CancellationFeeStatus::Dismissed,
            "charged" => CancellationFeeStatus::Charged,
            _ => CancellationFeeStatus::NotApplicable,
        }
    }
}
