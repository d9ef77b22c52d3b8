//! Client configuration.
//!
//! This module provides the types used to configure a [`RestClient`]:
//! where it sends requests, how it authenticates, and how its cache, rate
//! limiter and retry policy behave.
//!
//! # Overview
//!
//! - [`ClientConfig`]: The validated configuration consumed by the client
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated API base URL
//! - [`AccessToken`]: A non-empty secret with masked debug output
//! - [`RateLimitPreset`]: Named request budgets for known upstream APIs
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::{ClientConfig, Credentials, RateLimitPreset};
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.github.com")
//!     .credentials(Credentials::bearer("ghp_example").unwrap())
//!     .rate_limit(RateLimitPreset::GitHub)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url().as_ref(), "https://api.github.com");
//! ```
//!
//! [`RestClient`]: crate::RestClient

mod newtypes;
mod preset;

pub use newtypes::{AccessToken, BaseUrl};
pub use preset::RateLimitPreset;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::auth::{AuthProvider, Credentials};
use crate::cache::{CacheConfig, ResponseCache};
use crate::clients::{HttpResponse, RetryConfig};
use crate::error::ConfigError;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Configuration for a [`RestClient`](crate::RestClient).
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`. Cloning shares the auth
/// provider and any explicitly shared cache or rate limiter.
///
/// # Sharing state
///
/// Each client built from a configuration gets its own cache and rate
/// limiter unless [`ClientConfigBuilder::shared_cache`] or
/// [`ClientConfigBuilder::shared_rate_limiter`] was used. Only share a
/// limiter between clients that should draw from the same quota.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: BaseUrl,
    auth: Arc<dyn AuthProvider>,
    default_headers: HashMap<String, String>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    cache: CacheConfig,
    rate_limit: RateLimitConfig,
    retry: RetryConfig,
    shared_cache: Option<Arc<ResponseCache<HttpResponse>>>,
    shared_rate_limiter: Option<Arc<RateLimiter>>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the auth header provider.
    #[must_use]
    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.auth)
    }

    /// Returns headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the cache settings.
    #[must_use]
    pub const fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// Returns the rate limit settings.
    #[must_use]
    pub const fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the cache to use: the shared one, or a fresh one.
    pub(crate) fn make_cache(&self) -> Arc<ResponseCache<HttpResponse>> {
        self.shared_cache
            .clone()
            .unwrap_or_else(|| Arc::new(ResponseCache::new(self.cache.clone())))
    }

    /// Returns the rate limiter to use: the shared one, or a fresh one.
    pub(crate) fn make_rate_limiter(&self) -> Arc<RateLimiter> {
        self.shared_rate_limiter
            .clone()
            .unwrap_or_else(|| Arc::new(RateLimiter::new(self.rate_limit.clone())))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("user_agent_prefix", &self.user_agent_prefix)
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .field("shared_cache", &self.shared_cache.is_some())
            .field("shared_rate_limiter", &self.shared_rate_limiter.is_some())
            .finish()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// The only required field is `base_url`.
///
/// # Defaults
///
/// - credentials: [`Credentials::None`]
/// - cache: enabled, 5 minute TTL, 1000 entries
/// - rate limit: 100 requests per 60 seconds
/// - retry: 3 retries, 1 second base delay, statuses 429, 503 and 504
/// - timeout: none
///
/// # Example
///
/// ```rust
/// use fluent_rest::cache::CacheConfig;
/// use fluent_rest::{ClientConfig, Credentials, RetryConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.spotify.com/v1")
///     .credentials(Credentials::oauth2("BQD-example").unwrap())
///     .rate_limit("spotify".parse::<fluent_rest::RateLimitPreset>().unwrap())
///     .cache(CacheConfig::disabled())
///     .retry(RetryConfig::default().with_max_retries(5))
///     .header("Accept-Language", "en")
///     .user_agent_prefix("MyApp/1.0")
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.rate_limit().max_requests, 180);
/// ```
#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    auth: Option<Arc<dyn AuthProvider>>,
    default_headers: HashMap<String, String>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    cache: Option<CacheConfig>,
    rate_limit: Option<RateLimitPreset>,
    retry: Option<RetryConfig>,
    shared_cache: Option<Arc<ResponseCache<HttpResponse>>>,
    shared_rate_limiter: Option<Arc<RateLimiter>>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (required). Validated by [`build`](Self::build).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses static credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.auth = Some(Arc::new(credentials));
        self
    }

    /// Uses a custom auth header provider, such as a
    /// [`TokenRefresher`](crate::auth::TokenRefresher).
    #[must_use]
    pub fn auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(provider));
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the cache settings.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the rate limit from a preset or an explicit [`RateLimitConfig`].
    #[must_use]
    pub fn rate_limit(mut self, preset: impl Into<RateLimitPreset>) -> Self {
        self.rate_limit = Some(preset.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Shares an existing cache instead of creating one per client.
    #[must_use]
    pub fn shared_cache(mut self, cache: Arc<ResponseCache<HttpResponse>>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Shares an existing rate limiter, and therefore its quota, with
    /// other clients.
    #[must_use]
    pub fn shared_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.shared_rate_limiter = Some(limiter);
        self
    }

    /// Builds the [`ClientConfig`], validating all fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not
    /// set, [`ConfigError::InvalidBaseUrl`] if it is malformed,
    /// [`ConfigError::InvalidHeader`] if a default header cannot be sent, and
    /// [`ConfigError::ZeroValue`] if a rate limit setting is zero.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;
        let base_url = BaseUrl::new(base_url)?;

        for (name, value) in &self.default_headers {
            let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !valid {
                return Err(ConfigError::InvalidHeader { name: name.clone() });
            }
        }

        let rate_limit = self
            .rate_limit
            .map(|preset| preset.config())
            .unwrap_or_default();
        rate_limit.validate()?;
        if let Some(limiter) = &self.shared_rate_limiter {
            limiter.config().validate()?;
        }

        Ok(ClientConfig {
            base_url,
            auth: self
                .auth
                .unwrap_or_else(|| Arc::new(Credentials::None)),
            default_headers: self.default_headers,
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout,
            cache: self.cache.unwrap_or_default(),
            rate_limit,
            retry: self.retry.unwrap_or_default(),
            shared_cache: self.shared_cache,
            shared_rate_limiter: self.shared_rate_limiter,
        })
    }
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientConfigBuilder::new().build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "base_url" })
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let result = ClientConfig::builder().base_url("not a url").build();
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .build()
            .unwrap();

        assert_eq!(config.cache(), &CacheConfig::default());
        assert_eq!(config.rate_limit(), &RateLimitConfig::default());
        assert_eq!(config.retry(), &RetryConfig::default());
        assert!(config.default_headers().is_empty());
        assert!(config.user_agent_prefix().is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_builder_applies_preset() {
        let config = ClientConfig::builder()
            .base_url("https://api.vercel.com")
            .rate_limit(RateLimitPreset::Vercel)
            .build()
            .unwrap();

        assert_eq!(config.rate_limit().max_requests, 100);
        assert_eq!(config.rate_limit().window, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_accepts_explicit_rate_limit() {
        let explicit = RateLimitConfig::new(7, Duration::from_secs(3)).unwrap();
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .rate_limit(explicit.clone())
            .build()
            .unwrap();

        assert_eq!(config.rate_limit(), &explicit);
    }

    #[test]
    fn test_builder_rejects_zero_rate_limits() {
        let zero_budget = RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(1),
            retry_after: Duration::from_secs(1),
        };
        let result = ClientConfig::builder()
            .base_url("https://api.example.com")
            .rate_limit(zero_budget)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::ZeroValue {
                field: "max_requests"
            })
        ));

        let zero_block = RateLimitConfig {
            max_requests: 5,
            window: Duration::from_secs(1),
            retry_after: Duration::ZERO,
        };
        let result = ClientConfig::builder()
            .base_url("https://api.example.com")
            .shared_rate_limiter(Arc::new(RateLimiter::new(zero_block)))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::ZeroValue {
                field: "retry_after"
            })
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_header() {
        let result = ClientConfig::builder()
            .base_url("https://api.example.com")
            .header("Bad Header", "value")
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidHeader { name }) if name == "Bad Header"
        ));
    }

    #[test]
    fn test_shared_state_is_reused() {
        let limiter = Arc::new(RateLimiter::default());
        let cache = Arc::new(ResponseCache::default());
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .shared_rate_limiter(Arc::clone(&limiter))
            .shared_cache(Arc::clone(&cache))
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(&config.make_rate_limiter(), &limiter));
        assert!(Arc::ptr_eq(&config.make_cache(), &cache));
    }

    #[test]
    fn test_unshared_state_is_fresh_per_call() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .build()
            .unwrap();

        assert!(!Arc::ptr_eq(&config.make_cache(), &config.make_cache()));
    }

    #[test]
    fn test_debug_does_not_leak_credentials() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .credentials(Credentials::bearer("super-secret").unwrap())
            .header("X-Api-Secret", "also-secret")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("ClientConfig"));
        assert!(!debug_str.contains("super-secret"));
        assert!(!debug_str.contains("also-secret"));
    }
}
