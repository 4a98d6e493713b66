//! Fixed-interval pacing between requests to the charts site.

use tokio::time::{Duration, Instant};

/// Keeps consecutive sessions at least `interval` apart
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Wait until `interval` has passed since the previous call.
    ///
    /// The first call returns immediately.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::info!("Pausing {:?} before next date", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
