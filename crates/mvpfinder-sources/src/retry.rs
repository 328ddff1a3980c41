//! Exponential backoff for rate-limited source requests.
//!
//! [`retry_on_rate_limit`] wraps one physical request (token exchange,
//! listing page or GraphQL call). Only an HTTP 429 is worth waiting for; the
//! upstream APIs answer everything else the same way on a second try.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// Executes `operation`, retrying on [`SourceError::RateLimited`].
///
/// **Retried:**
/// - [`SourceError::RateLimited`]: HTTP 429 from the token or data endpoint.
///
/// **Returned immediately:**
/// - [`SourceError::UnexpectedStatus`]: any other non-2xx status.
/// - [`SourceError::Http`]: connect failures, timeouts, body read errors.
/// - [`SourceError::Api`]: GraphQL `errors` payload or missing `data`.
/// - [`SourceError::Deserialize`]: response body does not match the wire types.
///
/// Schedule with the default `initial_backoff = 2 000 ms` and `max_retries = 3`:
///
/// | Retry | Sleep before it      |
/// |-------|----------------------|
/// | 0     | 2 000 ms × 2⁰        |
/// | 1     | 2 000 ms × 2¹        |
/// | 2     | 2 000 ms × 2²        |
///
/// The operation therefore runs at most `max_retries + 1` times. When every
/// attempt is rate limited the returned error reports `max_retries`.
pub(crate) async fn retry_on_rate_limit<T, F, Fut>(
    max_retries: u32,
    initial_backoff: Duration,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(SourceError::RateLimited { platform, .. }) => {
                if attempt >= max_retries {
                    return Err(SourceError::RateLimited {
                        platform,
                        retries: max_retries,
                    });
                }

                let delay = backoff_delay(initial_backoff, attempt);
                tracing::warn!(
                    platform,
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "rate limited, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// `initial_backoff * 2^attempt`, saturating on extreme configs.
pub(crate) fn backoff_delay(initial_backoff: Duration, attempt: u32) -> Duration {
    initial_backoff.saturating_mul(1u32 << attempt.min(31))
}
