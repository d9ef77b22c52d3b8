//! The REST client entry point.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::CacheStats;
use crate::clients::{HttpError, HttpResponse, RequestDescriptor, RequestExecutor, RequestOptions};
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::rate_limit::RateLimitInfo;
use crate::rest::builder::PathBuilder;
use crate::rest::catalog::ResourceCatalog;

/// A client for one REST API.
///
/// Provides chainable path building ([`path`](Self::path)), catalog calls
/// ([`call`](Self::call)), raw request execution, and management of the
/// client's cache and rate limiter.
///
/// # Thread Safety
///
/// `RestClient` is `Clone`, `Send` and `Sync`. Clones share the executor,
/// and with it the cache and rate limiter.
///
/// # Example
///
/// ```rust,ignore
/// use fluent_rest::{ClientConfig, Credentials, RateLimitPreset, RequestOptions, RestClient};
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.github.com")
///     .credentials(Credentials::bearer(std::env::var("GITHUB_TOKEN")?)?)
///     .rate_limit(RateLimitPreset::GitHub)
///     .build()?;
/// let client = RestClient::new(&config)?;
///
/// let user: serde_json::Value = client.path("users").segment("octocat").get(RequestOptions::new()).await?;
///
/// // Writes invalidate cached reads of the same URL.
/// client.path("user").segment("repos")
///     .post::<serde_json::Value>(RequestOptions::new().body(serde_json::json!({"name": "demo"})))
///     .await?;
///
/// println!("{:?}", client.rate_limit_info());
/// ```
#[derive(Clone, Debug)]
pub struct RestClient {
    executor: Arc<RequestExecutor>,
    catalog: Arc<ResourceCatalog>,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient {
    /// Creates a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be
    /// created.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let executor = RequestExecutor::new(config)?;
        tracing::debug!("Created REST client for {}", config.base_url());
        Ok(Self {
            executor: Arc::new(executor),
            catalog: Arc::new(ResourceCatalog::new()),
        })
    }

    /// Registers an endpoint catalog for [`call`](Self::call).
    #[must_use]
    pub fn with_catalog(mut self, catalog: ResourceCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Returns the registered catalog.
    #[must_use]
    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Returns the executor shared by every builder of this client.
    #[must_use]
    pub const fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Returns a builder for the API root.
    #[must_use]
    pub fn root(&self) -> PathBuilder {
        PathBuilder::new(Arc::clone(&self.executor))
    }

    /// Returns a builder for the first path segment.
    #[must_use]
    pub fn path(&self, segment: impl Into<String>) -> PathBuilder {
        self.root().segment(segment)
    }

    /// Calls a catalog method and decodes the body.
    ///
    /// `args` fills the `{placeholders}` of the method path.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if the resource or method is
    /// unknown or a placeholder has no argument, and otherwise the errors
    /// of [`RequestExecutor::execute`].
    pub async fn call<T, I, K, V>(
        &self,
        resource: &str,
        method: &str,
        args: I,
        options: RequestOptions,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let args: HashMap<String, String> = args
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        let (verb, path) = self.catalog.resolve(resource, method, &args)?;
        let response = self.executor.request(verb, path, options).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    /// Executes a prepared request and returns the raw response.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn execute(
        &self,
        request: RequestDescriptor,
        options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        self.executor.execute(request, options).await
    }

    /// Removes every cached response.
    pub fn clear_cache(&self) {
        self.executor.cache().clear();
    }

    /// Removes cached responses whose key contains `pattern`, or all of
    /// them when `pattern` is `None`. Returns the number removed.
    pub fn invalidate_cache(&self, pattern: Option<&str>) -> usize {
        self.executor.cache().invalidate(pattern)
    }

    /// Returns cache hit and eviction counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.executor.cache().stats()
    }

    /// Returns the remaining request budget of this client's rate limiter.
    #[must_use]
    pub fn rate_limit_info(&self) -> RateLimitInfo {
        self.executor
            .rate_limiter()
            .info(self.executor.limiter_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{HttpMethod, InvalidHttpRequestError};
    use crate::config::RateLimitPreset;
    use crate::rest::catalog::{MethodDefinition, ResourceDefinition};

    fn client() -> RestClient {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .rate_limit(RateLimitPreset::Notion)
            .build()
            .unwrap();
        RestClient::new(&config).unwrap()
    }

    #[test]
    fn test_path_starts_builder() {
        let builder = client().path("users").segment("octocat");
        assert_eq!(builder.url(), "https://api.example.com/users/octocat");
    }

    #[test]
    fn test_clones_share_executor() {
        let client = client();
        let clone = client.clone();
        assert!(Arc::ptr_eq(client.executor(), clone.executor()));
    }

    #[tokio::test]
    async fn test_rate_limit_info_reports_full_budget() {
        let info = client().rate_limit_info();
        assert_eq!(info.limit, 3);
        assert_eq!(info.remaining, 3);
    }

    #[test]
    fn test_invalidate_cache_on_empty_cache() {
        let client = client();
        assert_eq!(client.invalidate_cache(Some("users")), 0);
        client.clear_cache();
        assert_eq!(client.cache_stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_call_unknown_method_fails_before_io() {
        let client = client().with_catalog(ResourceCatalog::new().resource(
            "users",
            ResourceDefinition::new("users")
                .method("get", MethodDefinition::new("{username}").with_method(HttpMethod::Get)),
        ));

        let error = client
            .call::<serde_json::Value, _, _, _>("users", "get", [("login", "octocat")], RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            HttpError::InvalidRequest(InvalidHttpRequestError::MissingPathParameter { .. })
        ));
        assert_eq!(client.rate_limit_info().remaining, 3);
    }
}
