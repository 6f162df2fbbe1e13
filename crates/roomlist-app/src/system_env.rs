//! Production environment backed by the tokio clock.

use std::time::Duration;

use roomlist_core::Environment;

/// Environment using `tokio::time`.
///
/// Using the runtime clock rather than `std::time` means runtime-level time
/// control (a paused test runtime) applies to viewport throttling as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
