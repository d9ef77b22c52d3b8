//! # fluent-rest
//!
//! A REST client runtime for building per-service SDKs. Callers describe a
//! resource path by chaining segments, and the runtime turns that path into
//! an authenticated, cached, rate-limited, retrying HTTP request.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - A chainable [`PathBuilder`] with `get`, `post`, `put`, `patch`,
//!   `delete`, `paginate` and `stream` terminal verbs
//! - An in-memory response cache with TTL, size-bounded eviction and
//!   invalidation on writes ([`cache`])
//! - A sliding-window rate limiter with presets for common APIs
//!   ([`rate_limit`], [`RateLimitPreset`])
//! - Retry with exponential backoff, `Retry-After` handling and a single
//!   re-authentication attempt after `401` ([`RetryConfig`])
//! - Pluggable authentication ([`Credentials`], [`auth::AuthProvider`])
//! - Declarative endpoint catalogs ([`ResourceCatalog`])
//!
//! ## Quick Start
//!
//! ```rust
//! use fluent_rest::{ClientConfig, Credentials, RateLimitPreset, RestClient};
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.github.com")
//!     .credentials(Credentials::bearer("ghp_example").unwrap())
//!     .rate_limit(RateLimitPreset::GitHub)
//!     .build()
//!     .unwrap();
//!
//! let client = RestClient::new(&config).unwrap();
//! let repos = client.path("users").segment("octocat").segment("repos");
//! assert_eq!(repos.url(), "https://api.github.com/users/octocat/repos");
//! ```
//!
//! ## Making Requests
//!
//! Nothing is sent until a terminal verb is called. Responses decode into
//! any `serde` type:
//!
//! ```rust,ignore
//! use fluent_rest::RequestOptions;
//!
//! #[derive(serde::Deserialize)]
//! struct Repo {
//!     name: String,
//!     stargazers_count: u64,
//! }
//!
//! let repo: Repo = client
//!     .path("repos")
//!     .segment("rust-lang")
//!     .segment("rust")
//!     .get(RequestOptions::new())
//!     .await?;
//! ```
//!
//! ## Error Handling
//!
//! Every request failure is an [`HttpError`]; nothing in the request path
//! panics. Configuration defects are reported as [`ConfigError`] by
//! constructors and builders.
//!
//! ```rust,ignore
//! use fluent_rest::{ErrorKind, HttpError};
//!
//! match client.path("user").get::<serde_json::Value>(RequestOptions::new()).await {
//!     Ok(user) => println!("{user}"),
//!     Err(HttpError::RateLimited(e)) => println!("retry after {:?}", e.retry_after),
//!     Err(e) if e.kind() == ErrorKind::Authentication => println!("bad token"),
//!     Err(e) => println!("{} ({:?})", e.message(), e.status_code()),
//! }
//! ```
//!
//! ## Cancellation
//!
//! A request can be aborted with a [`futures::future::AbortHandle`]. An
//! aborted request returns [`HttpError::Cancelled`] and never touches the
//! cache.
//!
//! ```rust,ignore
//! use futures::future::AbortHandle;
//!
//! let (handle, registration) = AbortHandle::new_pair();
//! let request = client.path("search").get::<serde_json::Value>(
//!     RequestOptions::new().abort_registration(registration),
//! );
//! handle.abort();
//! assert!(matches!(request.await, Err(HttpError::Cancelled)));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events for retries, rate limit waits and
//! cache activity. It never installs a subscriber.

pub mod auth;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod rest;

// Re-export public types at crate root for convenience
pub use auth::{AuthProvider, Credentials, TokenRefresher};
pub use config::{AccessToken, BaseUrl, ClientConfig, ClientConfigBuilder, RateLimitPreset};
pub use error::ConfigError;

// Re-export HTTP execution types
pub use clients::{
    ErrorKind, HttpError, HttpMethod, HttpResponse, HttpResponseError, InvalidHttpRequestError,
    MaxHttpRetriesExceededError, PaginationInfo, RateLimitedError, RequestDescriptor,
    RequestDescriptorBuilder, RequestExecutor, RequestOptions, RetryConfig, ServerRateLimit,
};

// Re-export REST types
pub use rest::{
    MethodDefinition, PageOptions, PathBuilder, ResourceCatalog, ResourceDefinition, RestClient,
};
