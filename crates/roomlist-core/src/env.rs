//! Environment abstraction for deterministic testing.
//!
//! Decouples throttling logic from the system clock. The viewport throttler
//! only ever compares instants handed to it, so tests drive it with synthetic
//! time while production uses the runtime clock.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `tokio::time::Instant` so that runtime-level time
    /// control applies to the throttler as well.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines take instants as input.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
