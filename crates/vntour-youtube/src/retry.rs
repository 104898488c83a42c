//! Retry with exponential back-off and jitter for the YouTube client.
//!
//! Search and video lookups cost quota units on every call, including failed
//! ones, so only transient failures are retried. Quota exhaustion and client
//! errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use vntour_core::retry::{retry, Backoff};

use crate::error::YoutubeError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Retriable: timeouts, connection failures, HTTP 429, and 5xx responses.
/// Everything else (quota, 4xx, malformed bodies) is a hard stop.
pub(crate) fn is_retriable(err: &YoutubeError) -> bool {
    match err {
        YoutubeError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        YoutubeError::RateLimited => true,
        YoutubeError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before attempt `n + 1` is `backoff_base_ms * 2^(n-1)` with
/// ±25 % jitter, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    operation: F,
) -> Result<T, YoutubeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, YoutubeError>>,
{
    let backoff = Backoff::exponential(Duration::from_millis(backoff_base_ms));
    retry(max_retries, backoff, is_retriable, operation).await
}
