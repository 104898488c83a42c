//! Fixed back-off retry for Google Trends requests.
//!
//! Trends rate limits are per IP and reset slowly, so the delay does not grow
//! between attempts. Anything other than throttling, an empty answer, or a
//! network-level failure is returned immediately.

use std::future::Future;
use std::time::Duration;

use vntour_core::retry::{retry, Backoff};

use crate::error::TrendsError;

/// Returns `true` if `err` is worth another attempt after the back-off delay.
pub(crate) fn is_retriable(err: &TrendsError) -> bool {
    match err {
        TrendsError::RateLimited | TrendsError::EmptyResponse(_) => true,
        TrendsError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Runs `operation`, retrying retriable errors up to `max_retries` more times
/// with `delay` between attempts.
///
/// With `max_retries = 0` the operation runs exactly once.
pub(crate) async fn retry_fixed<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    operation: F,
) -> Result<T, TrendsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TrendsError>>,
{
    retry(max_retries, Backoff::Fixed(delay), is_retriable, operation).await
}
