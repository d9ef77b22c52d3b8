//! The request executor.
//!
//! [`RequestExecutor`] turns a [`RequestDescriptor`] into an HTTP call. It
//! consults the response cache and the rate limiter, merges default, auth
//! and per-call headers, retries transient failures with exponential
//! backoff, gives the auth provider one chance to refresh after a `401`,
//! and keeps the cache consistent with successful writes.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::Abortable;

use crate::auth::AuthProvider;
use crate::cache::ResponseCache;
use crate::clients::errors::{
    HttpError, HttpResponseError, MaxHttpRetriesExceededError, RateLimitedError,
};
use crate::clients::http_request::{HttpMethod, RequestDescriptor, RequestOptions};
use crate::clients::http_response::HttpResponse;
use crate::clients::retry::RetryConfig;
use crate::config::{BaseUrl, ClientConfig};
use crate::error::ConfigError;
use crate::rate_limit::RateLimiter;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Executes requests against one upstream API.
///
/// The executor handles:
/// - URL construction from the base URL, path and query parameters
/// - Cache reads for GET requests and invalidation after writes
/// - Rate limiting keyed by the base URL
/// - Default headers including User-Agent and Accept
/// - Retry with exponential backoff for network errors and retryable statuses
/// - A single re-authentication attempt after `401`
///
/// # Thread Safety
///
/// `RequestExecutor` is `Send + Sync`. It is normally shared behind an
/// `Arc` by every [`PathBuilder`](crate::PathBuilder) of a client.
#[derive(Debug)]
pub struct RequestExecutor {
    client: reqwest::Client,
    base_url: BaseUrl,
    default_headers: HashMap<String, String>,
    auth: Arc<dyn AuthProvider>,
    cache: Arc<ResponseCache<HttpResponse>>,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryConfig,
    limiter_key: String,
}

// Verify RequestExecutor is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestExecutor>();
};

impl RequestExecutor {
    /// Creates an executor from a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!("{user_agent_prefix}fluent-rest v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        for (key, value) in config.default_headers() {
            default_headers.insert(key.clone(), value.clone());
        }

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ConfigError::HttpClient {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            auth: config.auth(),
            cache: config.make_cache(),
            rate_limiter: config.make_rate_limiter(),
            retry: config.retry().clone(),
            limiter_key: config.base_url().to_string(),
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the response cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ResponseCache<HttpResponse>> {
        &self.cache
    }

    /// Returns the rate limiter.
    #[must_use]
    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Returns the key under which requests are counted by the rate limiter.
    #[must_use]
    pub fn limiter_key(&self) -> &str {
        &self.limiter_key
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Resolves the request URL without its query string.
    #[must_use]
    pub fn url_for(&self, request: &RequestDescriptor) -> String {
        if request.is_absolute() {
            request.path.clone()
        } else {
            self.base_url.join(&request.path)
        }
    }

    /// Executes a request.
    ///
    /// `options` contributes per-call switches (cache, rate limit, retry
    /// budget, TTL, cancellation). Parameters, headers and body are taken
    /// from `request`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - The auth provider fails (`Auth`)
    /// - A non-retryable non-2xx response is received (`Response`)
    /// - The server rejects the credentials twice (`Unauthorized`)
    /// - The server keeps answering `429` (`RateLimited`)
    /// - Retries are exhausted (`MaxRetries`)
    /// - A network error occurs and is not retried (`Network`)
    /// - The request is aborted (`Cancelled`)
    pub async fn execute(
        &self,
        request: RequestDescriptor,
        mut options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = self.url_for(&request);
        let use_cache = request.method == HttpMethod::Get && !options.skip_cache;

        if use_cache {
            if let Some(cached) = self.cache.get(HttpMethod::Get, &url, &request.params) {
                tracing::debug!("Cache hit for GET {}", url);
                return Ok(cached);
            }
        }

        let abort = options.abort.take();
        let dispatch = self.dispatch(&request, &url, &options);
        let response = match abort {
            Some(registration) => Abortable::new(dispatch, registration)
                .await
                .map_err(|_| {
                    tracing::debug!("{} {} was cancelled", request.method, url);
                    HttpError::Cancelled
                })??,
            None => dispatch.await?,
        };

        if request.method.is_mutating() {
            let removed = self.cache.invalidate(Some(&url));
            if removed > 0 {
                tracing::debug!("Invalidated {} cached responses for {}", removed, url);
            }
        } else if use_cache {
            self.cache.set(
                HttpMethod::Get,
                &url,
                response.clone(),
                &request.params,
                options.cache_ttl,
            );
        }

        Ok(response)
    }

    /// Builds a request from `options` and executes it.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn request(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        mut options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        let request = options.take_descriptor(method, path.into())?;
        self.execute(request, options).await
    }

    /// Waits for the rate limiter, then sends the request, retrying as the
    /// policy allows.
    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        url: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        if !options.skip_rate_limit && !self.rate_limiter.check_limit(&self.limiter_key) {
            tracing::debug!("Rate limit reached for {}, waiting", self.limiter_key);
            self.rate_limiter.acquire(&self.limiter_key).await;
        }

        let max_retries = options.max_retries.unwrap_or(self.retry.max_retries);
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        // Credentials only go to the configured API origin.
        let send_credentials = !request.is_absolute() || self.base_url.same_origin(url);
        if !send_credentials {
            tracing::debug!("Not sending credentials to foreign origin {}", url);
        }

        loop {
            let auth_headers = if send_credentials {
                self.auth.auth_headers().await?
            } else {
                HashMap::new()
            };

            let response = match self.send(request, url, &auth_headers).await {
                Ok(response) => response,
                Err(error) => {
                    if !self.retry.should_retry_error(&error) {
                        return Err(HttpError::Network(error));
                    }
                    if attempt >= max_retries {
                        if attempt == 0 {
                            return Err(HttpError::Network(error));
                        }
                        return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                            code: None,
                            retries: attempt,
                            message: error.to_string(),
                            details: None,
                        }));
                    }
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "{} {} failed ({}), retrying in {:?} ({}/{})",
                        request.method,
                        url,
                        error,
                        delay,
                        attempt + 1,
                        max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
            };

            if response.is_ok() {
                return Ok(response);
            }

            let code = response.code;

            if code == 401 {
                if send_credentials && !reauthenticated {
                    reauthenticated = true;
                    if self.auth.refresh().await? {
                        tracing::debug!("Re-authenticated after 401 from {}", url);
                        continue;
                    }
                }
                return Err(HttpError::Unauthorized(Self::response_error(&response)));
            }

            if self.retry.should_retry_status(code) && attempt < max_retries {
                let backoff = self.retry.delay_for(attempt);
                let delay = if code == 429 {
                    response.retry_after.unwrap_or(backoff)
                } else {
                    backoff
                };
                tracing::warn!(
                    "{} {} returned {}, retrying in {:?} ({}/{})",
                    request.method,
                    url,
                    code,
                    delay,
                    attempt + 1,
                    max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if code == 429 {
                return Err(HttpError::RateLimited(RateLimitedError {
                    retries: attempt,
                    retry_after: response.retry_after,
                    message: response.error_message(),
                    details: Some(response.body),
                }));
            }

            if attempt > 0 {
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code: Some(code),
                    retries: attempt,
                    message: response.error_message(),
                    details: Some(response.body),
                }));
            }

            return Err(HttpError::Response(Self::response_error(&response)));
        }
    }

    /// Sends one attempt.
    async fn send(
        &self,
        request: &RequestDescriptor,
        url: &str,
        auth_headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, reqwest::Error> {
        let mut req_builder = self.client.request(request.method.into(), url);

        // Later inserts win: defaults, then auth, then per-call headers.
        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        headers.extend(auth_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        headers.extend(request.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        tracing::debug!("{} {}", request.method, url);
        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;

        let body = if body_text.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
        };

        Ok(HttpResponse::new(code, res_headers, body))
    }

    /// Parses response headers into a `HashMap` keyed by lower-cased name.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn response_error(response: &HttpResponse) -> HttpResponseError {
        HttpResponseError {
            code: response.code,
            message: response.error_message(),
            details: Some(response.body.clone()),
            error_reference: response.request_id().map(String::from),
        }
    }
}
