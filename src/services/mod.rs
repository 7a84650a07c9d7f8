pub mod bookings;
pub mod cancellation;
pub mod capacity;
pub mod payments;
pub mod slots;
pub mod validation;
