use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Minimum spacing between consecutive requests of one client.
///
/// The delay is measured from the moment the previous request completed,
/// so a slow response does not eat into the next wait. With the default
/// 1 500 ms delay:
///
/// | Request | Completes at | Next may start at |
/// |---------|--------------|-------------------|
/// | 1       | t = 300 ms   | t = 1 800 ms      |
/// | 2       | t = 2 600 ms | t = 4 100 ms      |
///
/// Retries after a 429 also acquire a permit, but a backoff sleep longer than
/// the delay already covers the spacing. Token exchanges are not throttled.
#[derive(Debug)]
pub(crate) struct Throttle {
    delay: Duration,
    last_completed: Mutex<Option<Instant>>,
}

/// Held for the duration of one request; records its completion on drop.
pub(crate) struct ThrottlePermit<'a> {
    last_completed: MutexGuard<'a, Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_completed: Mutex::new(None),
        }
    }

    /// Waits until `delay` has passed since the previous request finished.
    ///
    /// Requests through the same throttle are serialized while a permit is
    /// held.
    pub(crate) async fn acquire(&self) -> ThrottlePermit<'_> {
        let guard = self.last_completed.lock().await;
        if let Some(last) = *guard {
            let ready_at = last + self.delay;
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(
                    wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "throttling source request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        ThrottlePermit {
            last_completed: guard,
        }
    }
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        *self.last_completed = Some(Instant::now());
    }
}
