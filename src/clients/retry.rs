//! Retry policy for transient failures.
//!
//! Failed attempts are retried with exponential backoff:
//! `delay = base_delay * 2^attempt`, so with the defaults a persistently
//! failing request waits 1s, 2s and 4s before giving up. A `429` carrying a
//! `Retry-After` header waits for the server-provided delay instead.

use std::collections::BTreeSet;
use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Status codes retried by default.
pub const DEFAULT_RETRY_STATUSES: [u16; 3] = [429, 503, 504];

/// Retry and backoff settings.
///
/// # Example
///
/// ```rust
/// use fluent_rest::RetryConfig;
/// use std::time::Duration;
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.delay_for(0), Duration::from_secs(1));
/// assert_eq!(retry.delay_for(2), Duration::from_secs(4));
/// assert!(retry.should_retry_status(503));
/// assert!(!retry.should_retry_status(500));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Response status codes that are retried.
    pub retry_statuses: BTreeSet<u16>,
    /// Whether connection and timeout errors are retried.
    pub retry_network_errors: bool,
}

impl RetryConfig {
    /// Returns a policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay.
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Replaces the set of retried status codes.
    #[must_use]
    pub fn with_retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_statuses = statuses.into_iter().collect();
        self
    }

    /// Returns the backoff delay before retry number `attempt` (zero based).
    ///
    /// Saturates instead of overflowing for very large attempts.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Returns `true` if a response with `code` should be retried.
    #[must_use]
    pub fn should_retry_status(&self, code: u16) -> bool {
        self.retry_statuses.contains(&code)
    }

    /// Returns `true` if a transport error should be retried.
    ///
    /// Errors raised while building the request are never retried.
    #[must_use]
    pub fn should_retry_error(&self, error: &reqwest::Error) -> bool {
        self.retry_network_errors && !error.is_builder() && !error.is_decode()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            retry_statuses: DEFAULT_RETRY_STATUSES.into_iter().collect(),
            retry_network_errors: true,
        }
    }
}
