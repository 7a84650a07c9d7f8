/// Captures a cancellation fee against a stored payment method and returns
/// the processor's charge reference. The booking id doubles as an
/// idempotency key for processors that take one.
///
/// The crate ships no production implementation; the surrounding platform
/// wires in its processor client, and tests use recording mocks.
pub trait PaymentGateway: Send + Sync {
    fn capture(
        &self,
        booking_id: &str,
        payment_method_ref: &str,
        amount_cents: i64,
    ) -> anyhow::Result<String>;
}
