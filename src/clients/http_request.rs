//! Request types.
//!
//! This module provides [`RequestDescriptor`], the immutable description of
//! one HTTP call, its builder, and [`RequestOptions`], the per-call knobs
//! accepted by every terminal verb.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use futures::future::AbortRegistration;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods supported by the runtime.
///
/// Serialized in upper case; lower-case names are accepted when
/// deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    #[serde(alias = "get")]
    Get,
    /// HTTP POST method for creating resources.
    #[serde(alias = "post")]
    Post,
    /// HTTP PUT method for replacing resources.
    #[serde(alias = "put")]
    Put,
    /// HTTP PATCH method for partially updating resources.
    #[serde(alias = "patch")]
    Patch,
    /// HTTP DELETE method for removing resources.
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Returns the upper-case method name used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` for verbs that change server state and therefore
    /// invalidate cached reads.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// An immutable description of one HTTP call.
///
/// `path` is relative to the client's base URL unless it starts with
/// `http://` or `https://`, in which case it is used as-is (pagination
/// `next` links are absolute).
///
/// # Example
///
/// ```rust
/// use fluent_rest::{HttpMethod, RequestDescriptor};
/// use serde_json::json;
///
/// let request = RequestDescriptor::builder(HttpMethod::Post, "repos/octocat/hello/issues")
///     .body(json!({"title": "Found a bug"}))
///     .param("dry_run", "true")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.method, HttpMethod::Post);
/// assert_eq!(request.params.get("dry_run"), Some(&"true".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Path relative to the base URL, or an absolute URL.
    pub path: String,
    /// Query parameters, kept sorted so signatures are deterministic.
    pub params: BTreeMap<String, String>,
    /// JSON body for non-GET verbs.
    pub body: Option<serde_json::Value>,
    /// Per-call headers, merged last.
    pub headers: HashMap<String, String>,
}

impl RequestDescriptor {
    /// Creates a new builder for the given method and path.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(method, path)
    }

    /// Returns `true` if `path` is an absolute URL.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `path` is empty
    /// - `method` is `Get` and a body is present
    /// - a header name or value cannot be sent over HTTP
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.path.trim_matches('/').is_empty() && !self.is_absolute() {
            return Err(InvalidHttpRequestError::EmptyPath);
        }

        if self.method == HttpMethod::Get && self.body.is_some() {
            return Err(InvalidHttpRequestError::BodyNotAllowed {
                method: self.method.to_string(),
            });
        }

        for (name, value) in &self.headers {
            let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !valid {
                return Err(InvalidHttpRequestError::InvalidHeader { name: name.clone() });
            }
        }

        Ok(())
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    method: HttpMethod,
    path: String,
    params: BTreeMap<String, String>,
    body: Option<serde_json::Value>,
    headers: HashMap<String, String>,
}

impl RequestDescriptorBuilder {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
            headers: HashMap::new(),
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the body if one is given.
    #[must_use]
    pub fn maybe_body(mut self, body: Option<serde_json::Value>) -> Self {
        self.body = body;
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Merges query parameters, later values winning.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Merges headers, later values winning.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Builds the [`RequestDescriptor`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<RequestDescriptor, InvalidHttpRequestError> {
        let request = RequestDescriptor {
            method: self.method,
            path: self.path,
            params: self.params,
            body: self.body,
            headers: self.headers,
        };
        request.verify()?;
        Ok(request)
    }
}

/// Per-call options accepted by every terminal verb.
///
/// # Example
///
/// ```rust
/// use fluent_rest::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::new()
///     .param("per_page", 100)
///     .header("X-GitHub-Api-Version", "2022-11-28")
///     .cache_ttl(Duration::from_secs(30));
/// ```
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Query parameters.
    pub params: BTreeMap<String, String>,
    /// Per-call headers.
    pub headers: HashMap<String, String>,
    /// JSON body for non-GET verbs.
    pub body: Option<serde_json::Value>,
    /// Bypass the cache for this call (read and write).
    pub skip_cache: bool,
    /// Bypass the rate limiter for this call.
    pub skip_rate_limit: bool,
    /// TTL for the cached response instead of the cache default.
    pub cache_ttl: Option<Duration>,
    /// Retry budget instead of the client default.
    pub max_retries: Option<u32>,
    /// Registration that cancels the call when its handle is aborted.
    pub abort: Option<AbortRegistration>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `body` to JSON and sets it as the request body.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `body` cannot be represented as JSON.
    pub fn json<B: serde::Serialize>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Bypasses the cache for this call.
    #[must_use]
    pub const fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    /// Bypasses the rate limiter for this call.
    #[must_use]
    pub const fn skip_rate_limit(mut self) -> Self {
        self.skip_rate_limit = true;
        self
    }

    /// Caches the response for `ttl` instead of the default.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Overrides the retry budget for this call.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Makes the call cancellable through the matching
    /// [`AbortHandle`](futures::future::AbortHandle).
    #[must_use]
    pub fn abort_registration(mut self, registration: AbortRegistration) -> Self {
        self.abort = Some(registration);
        self
    }

    /// Splits off everything except the abort registration, for calls that
    /// are repeated (pagination).
    /// Moves the request parts (params, headers, body) out of these options
    /// into a validated descriptor, leaving only the per-call switches.
    pub(crate) fn take_descriptor(
        &mut self,
        method: HttpMethod,
        path: String,
    ) -> Result<RequestDescriptor, InvalidHttpRequestError> {
        RequestDescriptor::builder(method, path)
            .params(std::mem::take(&mut self.params))
            .headers(std::mem::take(&mut self.headers))
            .maybe_body(self.body.take())
            .build()
    }

    #[must_use]
    pub(crate) fn page_template(&self) -> PageTemplate {
        PageTemplate {
            params: self.params.clone(),
            headers: self.headers.clone(),
            skip_cache: self.skip_cache,
            skip_rate_limit: self.skip_rate_limit,
            cache_ttl: self.cache_ttl,
            max_retries: self.max_retries,
        }
    }
}

/// The cloneable part of [`RequestOptions`].
#[derive(Clone, Debug, Default)]
pub(crate) struct PageTemplate {
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) skip_cache: bool,
    pub(crate) skip_rate_limit: bool,
    pub(crate) cache_ttl: Option<Duration>,
    pub(crate) max_retries: Option<u32>,
}

impl PageTemplate {
    pub(crate) fn to_options(&self) -> RequestOptions {
        RequestOptions {
            params: self.params.clone(),
            headers: self.headers.clone(),
            body: None,
            skip_cache: self.skip_cache,
            skip_rate_limit: self.skip_rate_limit,
            cache_ttl: self.cache_ttl,
            max_retries: self.max_retries,
            abort: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_only_get_is_non_mutating() {
        assert!(!HttpMethod::Get.is_mutating());
        assert!(HttpMethod::Post.is_mutating());
        assert!(HttpMethod::Put.is_mutating());
        assert!(HttpMethod::Patch.is_mutating());
        assert!(HttpMethod::Delete.is_mutating());
    }

    #[test]
    fn test_builder_creates_valid_get_request() {
        let request = RequestDescriptor::builder(HttpMethod::Get, "users/octocat")
            .build()
            .unwrap();

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "users/octocat");
        assert!(request.body.is_none());
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_post_without_body_is_allowed() {
        let request = RequestDescriptor::builder(HttpMethod::Post, "user/starred/a/b").build();
        assert!(request.is_ok());
    }

    #[test]
    fn test_get_with_body_is_rejected() {
        let result = RequestDescriptor::builder(HttpMethod::Get, "search")
            .body(json!({"q": "rust"}))
            .build();

        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::BodyNotAllowed { method }) if method == "GET"
        ));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(matches!(
            RequestDescriptor::builder(HttpMethod::Get, "/").build(),
            Err(InvalidHttpRequestError::EmptyPath)
        ));
    }

    #[test]
    fn test_unsendable_header_is_rejected() {
        let result = RequestDescriptor::builder(HttpMethod::Get, "users")
            .header("X-Trace", "line\nbreak")
            .build();
        assert_eq!(
            result.unwrap_err(),
            InvalidHttpRequestError::InvalidHeader {
                name: "X-Trace".to_string()
            }
        );

        let result = RequestDescriptor::builder(HttpMethod::Get, "users")
            .header("bad header", "value")
            .build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_absolute_path_is_detected() {
        let request = RequestDescriptor::builder(
            HttpMethod::Get,
            "https://api.spotify.com/v1/me/tracks?offset=20",
        )
        .build()
        .unwrap();
        assert!(request.is_absolute());
    }

    #[test]
    fn test_builder_params_are_sorted() {
        let request = RequestDescriptor::builder(HttpMethod::Get, "repos")
            .param("sort", "updated")
            .param("page", 2)
            .build()
            .unwrap();

        let keys: Vec<_> = request.params.keys().cloned().collect();
        assert_eq!(keys, vec!["page".to_string(), "sort".to_string()]);
        assert_eq!(request.params.get("page"), Some(&"2".to_string()));
    }

    #[test]
    fn test_options_json_serializes_body() {
        #[derive(serde::Serialize)]
        struct NewIssue<'a> {
            title: &'a str,
        }

        let options = RequestOptions::new()
            .json(&NewIssue { title: "bug" })
            .unwrap();
        assert_eq!(options.body, Some(json!({"title": "bug"})));
    }

    #[test]
    fn test_page_template_drops_body_and_abort() {
        let (_, registration) = futures::future::AbortHandle::new_pair();
        let options = RequestOptions::new()
            .param("per_page", 10)
            .body(json!({}))
            .skip_cache()
            .abort_registration(registration);

        let repeated = options.page_template().to_options();
        assert_eq!(repeated.params.get("per_page"), Some(&"10".to_string()));
        assert!(repeated.skip_cache);
        assert!(repeated.body.is_none());
        assert!(repeated.abort.is_none());
    }

    #[test]
    fn test_take_descriptor_moves_request_parts() {
        let mut options = RequestOptions::new()
            .param("q", "rust")
            .header("X-Trace", "1")
            .skip_cache();

        let request = options
            .take_descriptor(HttpMethod::Get, "search".to_string())
            .unwrap();
        assert_eq!(request.params.get("q"), Some(&"rust".to_string()));
        assert_eq!(request.headers.get("X-Trace"), Some(&"1".to_string()));
        assert!(options.params.is_empty());
        assert!(options.skip_cache);
    }

    #[test]
    fn test_http_method_deserializes_either_case() {
        let upper: HttpMethod = serde_json::from_str("\"PATCH\"").unwrap();
        let lower: HttpMethod = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(upper, HttpMethod::Patch);
        assert_eq!(lower, HttpMethod::Delete);
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
    }
}
