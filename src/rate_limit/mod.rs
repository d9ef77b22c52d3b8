//! Sliding-window rate limiting.
//!
//! [`RateLimiter`] keeps one [`RateLimitState`] per key (usually the API base
//! URL). Each state moves between two phases:
//!
//! - **Open**: requests are admitted and their timestamps recorded.
//! - **Blocked**: the window overflowed; nothing is admitted until
//!   `blocked_until` passes, after which the state is Open again.
//!
//! Timestamps older than the window are pruned lazily on each check. State is
//! process-local and never persisted.
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::rate_limit::{RateLimitConfig, RateLimiter};
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_secs(1)).unwrap());
//!
//! assert!(limiter.check_limit("api"));
//! assert!(limiter.check_limit("api"));
//! assert!(!limiter.check_limit("api"));
//! assert_eq!(limiter.remaining_requests("api"), 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::error::ConfigError;

/// Request budget for one limiter key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests admitted per window.
    pub max_requests: u32,
    /// Length of the sliding window.
    pub window: Duration,
    /// How long a key stays blocked after the window overflows.
    pub retry_after: Duration,
}

impl RateLimitConfig {
    /// Creates a config whose block duration equals the window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroValue`] if `max_requests` or `window` is zero.
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, ConfigError> {
        let config = Self {
            max_requests,
            window,
            retry_after: window,
        };
        config.validate()?;
        Ok(config)
    }

    /// Overrides how long a key stays blocked after overflowing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroValue`] if `retry_after` is zero.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Result<Self, ConfigError> {
        self.retry_after = retry_after;
        self.validate()?;
        Ok(self)
    }

    /// Checks that every limit is non-zero.
    ///
    /// The fields are public, so configs built as struct literals are
    /// checked again by [`ClientConfigBuilder::build`](crate::ClientConfigBuilder::build).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroValue`] naming the first zero field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroValue {
                field: "max_requests",
            });
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroValue { field: "window" });
        }
        if self.retry_after.is_zero() {
            return Err(ConfigError::ZeroValue {
                field: "retry_after",
            });
        }
        Ok(())
    }
}

/// Fallback wait in [`RateLimiter::acquire`] when no reset time is known.
const IDLE_WAIT: Duration = Duration::from_millis(10);

/// Adds `by` to `at`, saturating at a point decades ahead.
fn instant_after(at: Instant, by: Duration) -> Instant {
    at.checked_add(by)
        .or_else(|| at.checked_add(Duration::from_secs(86_400 * 365 * 30)))
        .unwrap_or(at)
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            retry_after: Duration::from_secs(60),
        }
    }
}

/// Mutable limiter state for a single key.
#[derive(Clone, Debug, Default)]
pub struct RateLimitState {
    /// Admission times inside the current window, oldest first.
    pub request_timestamps: VecDeque<Instant>,
    /// Whether the key is currently blocked.
    pub blocked: bool,
    /// When the block lifts.
    pub blocked_until: Option<Instant>,
}

impl RateLimitState {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.request_timestamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.request_timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn in_window(&self, now: Instant, window: Duration) -> usize {
        self.request_timestamps
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) < window)
            .count()
    }

    fn active_block(&self, now: Instant) -> Option<Instant> {
        match self.blocked_until {
            Some(until) if self.blocked && until > now => Some(until),
            _ => None,
        }
    }
}

/// Snapshot of a key's budget, for callers that back off proactively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Configured requests per window.
    pub limit: u32,
    /// Requests still available right now.
    pub remaining: u32,
    /// Time until the budget next frees up.
    pub reset_in: Duration,
    /// Wall-clock time at which the budget next frees up.
    pub reset_at: DateTime<Utc>,
}

/// Per-key sliding-window request counter.
///
/// `RateLimiter` is `Send + Sync`; the internal lock is never held across an
/// `.await`, so every check is atomic with respect to other tasks.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    states: Mutex<HashMap<String, RateLimitState>>,
}

// Verify RateLimiter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RateLimiter>();
};

impl RateLimiter {
    /// Creates a limiter applying `config` to every key.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the limiter configuration.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, RateLimitState>> {
        // A panic while holding the lock cannot leave a state half-written,
        // so the poisoned guard is still usable.
        self.states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Tries to admit one request for `key`.
    ///
    /// Returns `true` and records the request when the window has room.
    /// Returns `false` when the key is blocked or the window is full; in the
    /// latter case the key becomes blocked for `retry_after`.
    pub fn check_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = self.config.window;
        let mut states = self.states();
        let state = states.entry(key.to_string()).or_default();

        state.prune(now, window);

        if state.blocked {
            match state.blocked_until {
                Some(until) if until > now => return false,
                _ => {
                    tracing::debug!("Rate limit block lifted for {}", key);
                    state.blocked = false;
                    state.blocked_until = None;
                }
            }
        }

        if state.request_timestamps.len() >= self.config.max_requests as usize {
            state.blocked = true;
            state.blocked_until = Some(instant_after(now, self.config.retry_after));
            tracing::warn!(
                "Rate limit of {} requests per {:?} reached for {}, blocking for {:?}",
                self.config.max_requests,
                window,
                key,
                self.config.retry_after
            );
            return false;
        }

        state.request_timestamps.push_back(now);
        true
    }

    /// Suspends until the block on `key` lifts. Returns immediately when the
    /// key is not blocked.
    pub async fn wait_for_limit(&self, key: &str) {
        let until = {
            let states = self.states();
            states
                .get(key)
                .and_then(|state| state.active_block(Instant::now()))
        };

        if let Some(until) = until {
            tracing::debug!(
                "Waiting {:?} for rate limit on {}",
                until.saturating_duration_since(Instant::now()),
                key
            );
            tokio::time::sleep_until(until).await;
        }
    }

    /// Admits one request for `key`, waiting as long as necessary.
    ///
    /// The request is delayed, never dropped.
    pub async fn acquire(&self, key: &str) {
        while !self.check_limit(key) {
            let until = self.next_admission(key);
            if until > Instant::now() {
                tracing::debug!(
                    "Waiting {:?} for rate limit on {}",
                    until.saturating_duration_since(Instant::now()),
                    key
                );
                tokio::time::sleep_until(until).await;
            } else {
                tokio::time::sleep(IDLE_WAIT).await;
            }
        }
    }

    /// Returns the earliest instant `key` could be admitted again: the later
    /// of the block end and the moment the window has room.
    fn next_admission(&self, key: &str) -> Instant {
        let now = Instant::now();
        let window = self.config.window;
        let states = self.states();
        let Some(state) = states.get(key) else {
            return now;
        };
        let block_end = state.active_block(now).unwrap_or(now);
        let max = self.config.max_requests as usize;
        let in_window: Vec<&Instant> = state
            .request_timestamps
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) < window)
            .collect();
        let room_at = if max > 0 && in_window.len() >= max {
            // The request that must age out before one slot frees up.
            in_window
                .get(in_window.len() - max)
                .map_or(now, |ts| instant_after(**ts, window))
        } else {
            now
        };
        block_end.max(room_at)
    }

    /// Returns how many requests `key` may still make in the current window.
    #[must_use]
    pub fn remaining_requests(&self, key: &str) -> u32 {
        let now = Instant::now();
        let states = self.states();
        let Some(state) = states.get(key) else {
            return self.config.max_requests;
        };
        if state.active_block(now).is_some() {
            return 0;
        }
        let used = u32::try_from(state.in_window(now, self.config.window)).unwrap_or(u32::MAX);
        self.config.max_requests.saturating_sub(used)
    }

    /// Returns when the budget for `key` next frees up.
    ///
    /// That is the end of an active block, otherwise the moment the oldest
    /// request in the window ages out, otherwise now.
    #[must_use]
    pub fn reset_time(&self, key: &str) -> Instant {
        let now = Instant::now();
        let states = self.states();
        let Some(state) = states.get(key) else {
            return now;
        };
        if let Some(until) = state.active_block(now) {
            return until;
        }
        state
            .request_timestamps
            .iter()
            .find(|ts| now.saturating_duration_since(**ts) < self.config.window)
            .map_or(now, |oldest| instant_after(*oldest, self.config.window))
    }

    /// Returns a snapshot of the budget for `key`.
    #[must_use]
    pub fn info(&self, key: &str) -> RateLimitInfo {
        let remaining = self.remaining_requests(key);
        let reset_in = self.reset_time(key).saturating_duration_since(Instant::now());
        let now = Utc::now();
        let reset_at = chrono::Duration::from_std(reset_in)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now);
        RateLimitInfo {
            limit: self.config.max_requests,
            remaining,
            reset_in,
            reset_at,
        }
    }

    /// Returns `true` if `key` is currently blocked.
    #[must_use]
    pub fn is_blocked(&self, key: &str) -> bool {
        self.states()
            .get(key)
            .is_some_and(|state| state.active_block(Instant::now()).is_some())
    }

    /// Forgets all state for `key`.
    pub fn reset(&self, key: &str) {
        self.states().remove(key);
    }

    /// Forgets all state for every key.
    pub fn reset_all(&self) {
        self.states().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(max, Duration::from_millis(window_ms)).unwrap())
    }

    #[test]
    fn test_config_rejects_zero_values() {
        assert!(matches!(
            RateLimitConfig::new(0, Duration::from_secs(1)),
            Err(ConfigError::ZeroValue {
                field: "max_requests"
            })
        ));
        assert!(matches!(
            RateLimitConfig::new(1, Duration::ZERO),
            Err(ConfigError::ZeroValue { field: "window" })
        ));
        assert!(matches!(
            RateLimitConfig::new(1, Duration::from_secs(1))
                .unwrap()
                .with_retry_after(Duration::ZERO),
            Err(ConfigError::ZeroValue {
                field: "retry_after"
            })
        ));
    }

    #[test]
    fn test_validate_catches_struct_literals() {
        let config = RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(1),
            retry_after: Duration::from_secs(1),
        };
        assert!(config.validate().is_err());
        assert!(RateLimitConfig::default().validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_is_blocked_for_retry_after() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(2, Duration::from_millis(1000))
                .unwrap()
                .with_retry_after(Duration::from_millis(500))
                .unwrap(),
        );
        let start = Instant::now();

        assert!(limiter.check_limit("k"));
        assert!(limiter.check_limit("k"));
        assert!(!limiter.check_limit("k"));

        assert!(limiter.is_blocked("k"));
        assert_eq!(limiter.reset_time("k"), start + Duration::from_millis(500));
        assert_eq!(limiter.remaining_requests("k"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_key_unblocks_after_retry_after_and_window() {
        let limiter = limiter(2, 1000);
        assert!(limiter.check_limit("k"));
        assert!(limiter.check_limit("k"));
        assert!(!limiter.check_limit("k"));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!limiter.check_limit("k"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(limiter.check_limit("k"));
        assert!(!limiter.is_blocked("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = limiter(1, 1000);
        assert!(limiter.check_limit("github"));
        assert!(!limiter.check_limit("github"));
        assert!(limiter.check_limit("spotify"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_timestamps_are_pruned() {
        let limiter = limiter(3, 1000);
        assert!(limiter.check_limit("k"));
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(limiter.check_limit("k"));
        assert_eq!(limiter.remaining_requests("k"), 1);

        tokio::time::advance(Duration::from_millis(400)).await;
        // The first request has aged out of the window.
        assert_eq!(limiter.remaining_requests("k"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_limit_sleeps_until_block_lifts() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(1, Duration::from_millis(200))
                .unwrap()
                .with_retry_after(Duration::from_millis(300))
                .unwrap(),
        );
        assert!(limiter.check_limit("k"));
        assert!(!limiter.check_limit("k"));

        let start = Instant::now();
        limiter.wait_for_limit("k").await;
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert!(limiter.check_limit("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_limit_returns_immediately_when_open() {
        let limiter = limiter(5, 1000);
        let start = Instant::now();
        limiter.wait_for_limit("k").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_oldest_timestamp_to_age_out() {
        // A short block does not admit the request while the window is still full.
        let limiter = RateLimiter::new(
            RateLimitConfig::new(2, Duration::from_millis(1000))
                .unwrap()
                .with_retry_after(Duration::from_millis(300))
                .unwrap(),
        );
        let start = Instant::now();
        limiter.acquire("k").await;
        limiter.acquire("k").await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire("k").await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_reports_remaining_and_reset() {
        let limiter = limiter(3, 1000);
        assert!(limiter.check_limit("k"));

        let info = limiter.info("k");
        assert_eq!(info.limit, 3);
        assert_eq!(info.remaining, 2);
        assert_eq!(info.reset_in, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_key_has_full_budget() {
        let limiter = limiter(10, 1000);
        assert_eq!(limiter.remaining_requests("never-seen"), 10);
        assert_eq!(limiter.info("never-seen").reset_in, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_block() {
        let limiter = limiter(1, 1000);
        assert!(limiter.check_limit("k"));
        assert!(!limiter.check_limit("k"));

        limiter.reset("k");
        assert!(limiter.check_limit("k"));

        limiter.reset_all();
        assert_eq!(limiter.remaining_requests("k"), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_acquire_yields_while_waiting_without_block() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        // A zero block leaves only the window to wait for.
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(300),
            retry_after: Duration::ZERO,
        });
        assert!(limiter.check_limit("k"));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        let start = Instant::now();
        limiter.acquire("k").await;

        assert!(ran.load(Ordering::SeqCst));
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_retry_after_does_not_overflow() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::MAX,
            retry_after: Duration::MAX,
        });
        assert!(limiter.check_limit("k"));
        assert!(!limiter.check_limit("k"));
        assert!(limiter.is_blocked("k"));
        assert_eq!(limiter.remaining_requests("k"), 0);
        assert!(limiter.info("k").reset_in > Duration::from_secs(86_400));
    }
}
