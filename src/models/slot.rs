use serde::Serialize;

/// Outcome of a temporal check on a requested slot.
///
/// Policy failures are values, not errors: the `reason` is a customer-facing
/// sentence the calling layer may surface verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct SlotValidity {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SlotValidity {
    pub fn ok() -> Self {
        SlotValidity {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        SlotValidity {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of a capacity check for one (date, slot) pair.
#[derive(Debug, Clone, Serialize)]
pub struct SlotCapacity {
    pub available: bool,
    pub current_count: i64,
    pub max_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SlotCapacity {
    pub fn open(current_count: i64, max_count: i64) -> Self {
        SlotCapacity {
            available: true,
            current_count,
            max_count,
            reason: None,
        }
    }

    pub fn full(current_count: i64, max_count: i64) -> Self {
        SlotCapacity {
            available: false,
            current_count,
            max_count,
            reason: Some(format!(
                "This time slot is fully booked ({current_count}/{max_count}). Please choose another time."
            )),
        }
    }

    /// Fail-closed result for a count the store could not produce: the slot
    /// reads as at capacity, with a reason distinct from the fully-booked one.
    pub fn unverified(max_count: i64) -> Self {
        SlotCapacity {
            available: false,
            current_count: max_count,
            max_count,
            reason: Some(
                "We could not verify availability for this time slot. Please try again.".to_string(),
            ),
        }
    }
}

/// One row of a whole-day availability summary.
///
/// `available` is raw arithmetic and may go negative when the ceiling was
/// lowered under existing bookings; display layers clamp, operators see the
/// overage.
#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    pub slot: String,
    pub available: i64,
    pub total: i64,
}
