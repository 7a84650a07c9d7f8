pub mod booking;
pub mod slot;

pub use booking::{Booking, BookingStatus, CancellationFeeStatus};
pub use slot::{SlotAvailability, SlotCapacity, SlotValidity};
