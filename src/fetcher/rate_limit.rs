//! Per-host politeness delay.
//!
//! Every outbound request waits until at least `delay` has passed since the
//! previous request to the same host. Requests are issued one at a time, so
//! the limiter only has to remember when each host was last contacted.

use dashmap::DashMap;
use std::{sync::Arc, time::Duration};
use tokio::time::{Instant, sleep_until};
use tracing::debug;
use url::Url;

#[derive(Clone, Debug)]
pub struct RateLimiter {
    last_request: Arc<DashMap<String, Instant>>,
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            last_request: Arc::new(DashMap::new()),
            delay,
        }
    }

    /// Suspend until `url`'s host may be contacted again, then record the request.
    pub async fn wait(&self, url: &Url) {
        let host = url.host_str().unwrap_or_default().to_string();

        // Copy the deadline out so no map guard is held across the sleep.
        let ready_at = self
            .last_request
            .get(&host)
            .map(|last| *last.value() + self.delay);

        if let Some(ready_at) = ready_at
            && ready_at > Instant::now()
        {
            debug!(
                host = %host,
                wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "politeness delay"
            );
            sleep_until(ready_at).await;
        }

        self.last_request.insert(host, Instant::now());
    }
}
