//! HTTP execution layer.
//!
//! This module provides the foundation every terminal verb ends up in: the
//! request and response types, the error taxonomy, the retry policy, and
//! the [`RequestExecutor`] that ties the cache, the rate limiter and the
//! auth provider together.
//!
//! # Overview
//!
//! - [`RequestExecutor`]: Executes requests with caching, rate limiting and retries
//! - [`RequestDescriptor`]: An immutable description of one HTTP call
//! - [`RequestOptions`]: Per-call switches accepted by every terminal verb
//! - [`HttpResponse`]: A parsed response with pagination and rate limit headers
//! - [`HttpMethod`]: Supported HTTP methods
//! - [`RetryConfig`]: Backoff and retry settings
//! - [`HttpError`]: The unified error type
//!
//! # Retry Behavior
//!
//! - **Network errors, 429, 503, 504**: retried up to `max_retries` times
//!   with a delay of `base_delay * 2^attempt`; a `429` with `Retry-After`
//!   waits for the server-provided delay instead
//! - **401**: the auth provider may refresh once; the request is then sent
//!   again outside the backoff budget
//! - **Other errors (4xx, 500)**: returned immediately without retry
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_rest::{ClientConfig, HttpMethod, RequestDescriptor, RequestExecutor, RequestOptions};
//!
//! let config = ClientConfig::builder().base_url("https://api.github.com").build()?;
//! let executor = RequestExecutor::new(&config)?;
//!
//! let request = RequestDescriptor::builder(HttpMethod::Get, "users/octocat").build()?;
//! let response = executor.execute(request, RequestOptions::new()).await?;
//! println!("{}", response.body["login"]);
//! ```

mod errors;
mod executor;
mod http_request;
mod http_response;
mod retry;

pub use errors::{
    ErrorKind, HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
    RateLimitedError,
};
pub use executor::{RequestExecutor, SDK_VERSION};
pub(crate) use http_request::PageTemplate;
pub use http_request::{HttpMethod, RequestDescriptor, RequestDescriptorBuilder, RequestOptions};
pub use http_response::{parse_retry_after, HttpResponse, PaginationInfo, ServerRateLimit};
pub use retry::{RetryConfig, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_STATUSES};
