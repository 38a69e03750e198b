//! Client-side request pacing.
//!
//! Enforces a minimum interval between consecutive requests. Shared by all
//! callers of one transport; waiting callers are served in lock order.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum gap between two requests; zero disables pacing
    min_interval: Duration,
    /// Timestamp of the last request that went out
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second`; non-positive values disable the limiter.
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 && requests_per_second.is_finite() {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may be sent, then record it.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!(
                    wait_ms = wait_time.as_millis() as u64,
                    "Rate limit: waiting before next request"
                );
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
