//! Bounded retry loop shared by the Trends and YouTube clients.
//!
//! Each client supplies its own `is_retriable` predicate; this module only
//! owns the attempt counting and the delay schedule.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single exponential back-off delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same pause before every retry.
    Fixed(Duration),
    /// `base * 2^(n-1)` before retry `n`, with ±25 % jitter, capped at `cap`.
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    /// Exponential back-off capped at [`MAX_BACKOFF`].
    #[must_use]
    pub fn exponential(base: Duration) -> Self {
        Self::Exponential {
            base,
            cap: MAX_BACKOFF,
        }
    }

    /// Pause before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, cap } => {
                let factor = 1u32 << attempt.saturating_sub(1).min(10);
                let capped = base.saturating_mul(factor).min(cap);
                capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
            }
        }
    }
}

/// Runs `operation`, retrying errors accepted by `is_retriable` up to
/// `max_retries` more times. With `max_retries = 0` it runs exactly once.
///
/// # Errors
///
/// Returns the first non-retriable error, or the last error once the retries
/// are used up.
pub async fn retry<T, E, F, Fut, P>(
    max_retries: u32,
    backoff: Backoff,
    is_retriable: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff.delay(attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "request failed, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
