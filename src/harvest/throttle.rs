//! Fixed inter-request pause
//!
//! The harvester is strictly sequential, so courtesy towards the source is a
//! plain sleep between requests. No token bucket, no backoff.

use std::time::Duration;

/// Sleeps a fixed amount before each follow-up request
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits the configured delay
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        tracing::trace!("Pausing {}ms before next request", self.delay.as_millis());
        tokio::time::sleep(self.delay).await;
    }
}
