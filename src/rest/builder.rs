//! The chainable path builder.
//!
//! A [`PathBuilder`] is an immutable list of path segments bound to a shared
//! [`RequestExecutor`]. Adding a segment returns a new builder; nothing is
//! sent until a terminal verb (`get`, `post`, `put`, `patch`, `delete`,
//! `paginate`, `stream`) is called.
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_rest::{ClientConfig, RequestOptions, RestClient};
//!
//! let client = RestClient::new(&ClientConfig::builder().base_url("https://api.github.com").build()?)?;
//!
//! // GET https://api.github.com/users/octocat/repos?per_page=5
//! let repos: Vec<serde_json::Value> = client
//!     .path("users")
//!     .segment("octocat")
//!     .segment("repos")
//!     .get(RequestOptions::new().param("per_page", 5))
//!     .await?;
//! ```

use std::fmt;
use std::sync::Arc;

use futures::stream::Stream;
use serde::de::DeserializeOwned;

use crate::clients::{HttpError, HttpMethod, HttpResponse, RequestExecutor, RequestOptions};
use crate::rest::pagination::{self, PageOptions, Pager};

/// An immutable resource path plus the executor that will send it.
///
/// Segments are stored verbatim and percent-encoded when the path is
/// produced, so a segment may contain `/` or spaces (a GitLab project path
/// such as `group/project` becomes `group%2Fproject`). Use
/// [`segments`](Self::segments) to add several path components at once.
///
/// Terminal verbs are methods, not segment names, so any resource name,
/// including `get` or `delete`, can be addressed with
/// [`segment`](Self::segment).
#[derive(Clone)]
pub struct PathBuilder {
    executor: Arc<RequestExecutor>,
    segments: Vec<String>,
}

// Verify PathBuilder is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PathBuilder>();
};

impl PathBuilder {
    /// Creates a builder for the API root.
    #[must_use]
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            segments: Vec::new(),
        }
    }

    /// Returns a new builder with `name` appended.
    #[must_use]
    pub fn segment(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self {
            executor: Arc::clone(&self.executor),
            segments,
        }
    }

    /// Returns a new builder with every item of `names` appended.
    #[must_use]
    pub fn segments<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = self.segments.clone();
        segments.extend(names.into_iter().map(Into::into));
        Self {
            executor: Arc::clone(&self.executor),
            segments,
        }
    }

    /// Returns a new builder with an identifier appended.
    #[must_use]
    pub fn id(&self, id: impl fmt::Display) -> Self {
        self.segment(id.to_string())
    }

    /// Returns the raw segments.
    #[must_use]
    pub fn segment_list(&self) -> &[String] {
        &self.segments
    }

    /// Returns the encoded path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|segment| urlencoding::encode(segment))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns the absolute URL this builder points at.
    #[must_use]
    pub fn url(&self) -> String {
        self.executor.base_url().join(&self.path())
    }

    /// Sends a request with `method` and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] as described on
    /// [`RequestExecutor::execute`].
    pub async fn send(
        &self,
        method: HttpMethod,
        options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        self.executor.request(method, self.path(), options).await
    }

    async fn send_as<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        options: RequestOptions,
    ) -> Result<T, HttpError> {
        let response = self.send(method, options).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    /// Sends a GET request and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be
    /// decoded into `T`.
    pub async fn get<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T, HttpError> {
        self.send_as(HttpMethod::Get, options).await
    }

    /// Sends a POST request and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be
    /// decoded into `T`.
    pub async fn post<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T, HttpError> {
        self.send_as(HttpMethod::Post, options).await
    }

    /// Sends a PUT request and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be
    /// decoded into `T`.
    pub async fn put<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T, HttpError> {
        self.send_as(HttpMethod::Put, options).await
    }

    /// Sends a PATCH request and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be
    /// decoded into `T`.
    pub async fn patch<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T, HttpError> {
        self.send_as(HttpMethod::Patch, options).await
    }

    /// Sends a DELETE request and decodes the body.
    ///
    /// An empty body decodes as `{}`, so `serde_json::Value` is a safe
    /// choice for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body cannot be
    /// decoded into `T`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<T, HttpError> {
        self.send_as(HttpMethod::Delete, options).await
    }

    /// Fetches every page and returns all items in order.
    ///
    /// `options` is applied to every page; its body and abort registration
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first [`HttpError`] encountered. Items from earlier pages
    /// are discarded.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        pages: PageOptions,
    ) -> Result<Vec<T>, HttpError> {
        pagination::collect(self.pager(&options, pages)).await
    }

    /// Returns a lazy stream of items.
    ///
    /// A page is requested only when the items of the previous page have
    /// been consumed. Dropping the stream stops it; nothing is prefetched.
    /// The stream cannot be restarted.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use futures::StreamExt;
    ///
    /// let stream = client.path("repos").stream::<Repo>(RequestOptions::new(), PageOptions::new());
    /// futures::pin_mut!(stream);
    /// while let Some(repo) = stream.next().await {
    ///     println!("{}", repo?.name);
    /// }
    /// ```
    pub fn stream<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        pages: PageOptions,
    ) -> impl Stream<Item = Result<T, HttpError>> {
        pagination::into_stream(self.pager(&options, pages))
    }

    fn pager(&self, options: &RequestOptions, pages: PageOptions) -> Pager {
        Pager::new(
            Arc::clone(&self.executor),
            self.path(),
            options.page_template(),
            pages,
        )
    }
}

impl fmt::Debug for PathBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathBuilder")
            .field("base_url", self.executor.base_url())
            .field("segments", &self.segments)
            .finish()
    }
}

impl fmt::Display for PathBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
