use std::env;

use serde::{Deserialize, Serialize};

use crate::services::slots;

/// Business scheduling parameters, owned by the platform's settings screens
/// and passed explicitly into every operation that needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Maximum simultaneous bookings per (date, slot) pair.
    #[serde(default = "default_max_per_slot")]
    pub max_per_slot: i64,
    /// Minimum advance notice for a new or moved booking, in hours.
    #[serde(default = "default_min_lead_hours")]
    pub min_lead_hours: f64,
    /// Cancellations closer than this to the slot start owe a fee.
    #[serde(default = "default_fee_window_hours")]
    pub fee_window_hours: f64,
    /// Flat late-cancellation fee, in cents.
    #[serde(default = "default_cancellation_fee_cents")]
    pub cancellation_fee_cents: i64,
    /// Canonical slot labels offered for a day, in display order.
    #[serde(default = "default_day_slots")]
    pub day_slots: Vec<String>,
}

impl BookingPolicy {
    pub fn from_env() -> Self {
        Self {
            max_per_slot: env::var("MAX_BOOKINGS_PER_SLOT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_per_slot),
            min_lead_hours: env::var("MIN_LEAD_TIME_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_min_lead_hours),
            fee_window_hours: env::var("CANCELLATION_FEE_WINDOW_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_fee_window_hours),
            cancellation_fee_cents: env::var("CANCELLATION_FEE_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_cancellation_fee_cents),
            day_slots: env::var("DAY_SLOTS")
                .ok()
                .and_then(|v| serde_json::from_str(&v).ok())
                .unwrap_or_else(default_day_slots),
        }
    }

    /// Parse a policy from the JSON blob the business-settings table stores,
    /// rejecting slot labels the scheduler would not be able to place in time.
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let policy: BookingPolicy = serde_json::from_str(s)?;
        anyhow::ensure!(policy.max_per_slot > 0, "max_per_slot must be positive");
        anyhow::ensure!(
            policy.min_lead_hours >= 0.0,
            "min_lead_hours must not be negative"
        );
        anyhow::ensure!(
            policy.fee_window_hours >= 0.0,
            "fee_window_hours must not be negative"
        );
        anyhow::ensure!(
            policy.cancellation_fee_cents >= 0,
            "cancellation_fee_cents must not be negative"
        );
        anyhow::ensure!(!policy.day_slots.is_empty(), "day_slots must not be empty");
        for label in &policy.day_slots {
            slots::parse_start_time(label)
                .map_err(|e| anyhow::anyhow!("invalid slot label {label:?}: {e}"))?;
        }
        Ok(policy)
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_per_slot: default_max_per_slot(),
            min_lead_hours: default_min_lead_hours(),
            fee_window_hours: default_fee_window_hours(),
            cancellation_fee_cents: default_cancellation_fee_cents(),
            day_slots: default_day_slots(),
        }
    }
}

fn default_max_per_slot() -> i64 {
    3
}

fn default_min_lead_hours() -> f64 {
    12.0
}

fn default_fee_window_hours() -> f64 {
    24.0
}

fn default_cancellation_fee_cents() -> i64 {
    3500
}

fn default_day_slots() -> Vec<String> {
    [
        "9:00 AM - 11:00 AM",
        "11:00 AM - 1:00 PM",
        "1:00 PM - 3:00 PM",
        "3:00 PM - 5:00 PM",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
