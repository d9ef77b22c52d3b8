//! HTTP response types.
//!
//! This module provides the [`HttpResponse`] type and the header parsers it
//! relies on: `Link` pagination, `Retry-After`, and the common
//! `X-RateLimit-*` family.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Server-reported request budget from the `X-RateLimit-*` headers.
///
/// GitHub, GitLab, Discord and Vercel send some variant of
/// `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset`.
///
/// This is informational and exposed as [`HttpResponse::rate_limit`] for
/// callers that want to pace themselves. The client-side
/// [`RateLimiter`](crate::rate_limit::RateLimiter) does not read it; only
/// its own configured budget and a `429` with `Retry-After` affect request
/// timing.
///
/// # Example
///
/// ```rust
/// use fluent_rest::ServerRateLimit;
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// headers.insert("x-ratelimit-limit".to_string(), vec!["5000".to_string()]);
/// headers.insert("x-ratelimit-remaining".to_string(), vec!["4999".to_string()]);
///
/// let limit = ServerRateLimit::from_headers(&headers).unwrap();
/// assert_eq!(limit.limit, Some(5000));
/// assert_eq!(limit.remaining, 4999);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerRateLimit {
    /// Requests allowed per window, if reported.
    pub limit: Option<u32>,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Reset time as a Unix timestamp in seconds, if reported.
    pub reset: Option<i64>,
}

impl ServerRateLimit {
    /// Parses the budget from lower-cased response headers.
    ///
    /// Returns `None` when `X-RateLimit-Remaining` is absent or malformed.
    #[must_use]
    pub fn from_headers(headers: &HashMap<String, Vec<String>>) -> Option<Self> {
        let first = |name: &str| {
            headers
                .get(name)
                .and_then(|values| values.first())
                .map(|value| value.trim().to_string())
        };

        let remaining = first("x-ratelimit-remaining")?.parse().ok()?;
        let limit = first("x-ratelimit-limit").and_then(|v| v.parse().ok());
        // Some APIs send fractional epoch seconds; the whole part is enough.
        let reset = first("x-ratelimit-reset")
            .and_then(|v| v.split('.').next().and_then(|secs| secs.parse().ok()));

        Some(Self {
            limit,
            remaining,
            reset,
        })
    }

    /// Returns the reset time as a UTC timestamp, if reported.
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Pagination links parsed from the `Link` header.
///
/// Unlike cursor-only schemes, the full URL of each relation is kept so it
/// can be followed verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// URL of the next page.
    pub next: Option<String>,
    /// URL of the previous page.
    pub prev: Option<String>,
    /// URL of the first page.
    pub first: Option<String>,
    /// URL of the last page.
    pub last: Option<String>,
}

impl PaginationInfo {
    /// Parses a Link header value.
    ///
    /// The format is `<url>; rel="next", <url>; rel="last"`. Both `prev`
    /// and `previous` are accepted.
    ///
    /// ```rust
    /// use fluent_rest::PaginationInfo;
    ///
    /// let info = PaginationInfo::parse_link_header(
    ///     r#"<https://api.github.com/user/repos?page=3>; rel="next", <https://api.github.com/user/repos?page=50>; rel="last""#,
    /// );
    /// assert_eq!(info.next.as_deref(), Some("https://api.github.com/user/repos?page=3"));
    /// assert_eq!(info.last.as_deref(), Some("https://api.github.com/user/repos?page=50"));
    /// assert!(info.prev.is_none());
    /// ```
    #[must_use]
    pub fn parse_link_header(header_value: &str) -> Self {
        let mut result = Self::default();

        for link in header_value.split(',') {
            let mut parts = link.split(';');

            let Some(url) = parts
                .next()
                .map(|s| s.trim().trim_start_matches('<').trim_end_matches('>'))
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            let rel = parts.find_map(|part| {
                part.trim()
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"'))
            });

            // A single rel attribute may list several space separated relations.
            for rel in rel.unwrap_or_default().split_whitespace() {
                let slot = match rel {
                    "next" => &mut result.next,
                    "prev" | "previous" => &mut result.prev,
                    "first" => &mut result.first,
                    "last" => &mut result.last,
                    _ => continue,
                };
                *slot = Some(url.to_string());
            }
        }

        result
    }
}

/// Parses a `Retry-After` header value.
///
/// Accepts delay-seconds (integer or fractional) and HTTP-dates. Dates in
/// the past yield a zero delay. Values too large for a [`Duration`] are
/// ignored.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

/// A response received from the upstream API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers keyed by lower-cased name.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body (`{}` when empty).
    pub body: serde_json::Value,
    /// Links parsed from the `Link` header.
    pub pagination: PaginationInfo,
    /// Delay requested by the `Retry-After` header.
    pub retry_after: Option<Duration>,
    /// Budget reported by `X-RateLimit-*` headers.
    pub rate_limit: Option<ServerRateLimit>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing `Link`, `Retry-After` and
    /// `X-RateLimit-*` headers.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let pagination = headers
            .get("link")
            .map(|values| PaginationInfo::parse_link_header(&values.join(",")))
            .unwrap_or_default();

        let retry_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| parse_retry_after(value));

        let rate_limit = ServerRateLimit::from_headers(&headers);

        Self {
            code,
            headers,
            body,
            pagination,
            retry_after,
            rate_limit,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
            .or_else(|| self.header("x-github-request-id"))
    }

    /// Returns the URL of the next page.
    ///
    /// The `Link` header wins; otherwise a string `next` field in a JSON
    /// object body is used (Spotify-style pagination).
    #[must_use]
    pub fn next_page_url(&self) -> Option<&str> {
        self.pagination.next.as_deref().or_else(|| {
            self.body
                .get("next")
                .and_then(serde_json::Value::as_str)
                .filter(|next| next.starts_with("http://") || next.starts_with("https://"))
        })
    }

    /// Extracts a human readable error message from the body.
    ///
    /// Looks at `message`, `error.message`, `error_description`, `error`
    /// and `errors` in that order, falling back to the status code.
    #[must_use]
    pub fn error_message(&self) -> String {
        let body = &self.body;
        let text = |value: &serde_json::Value| match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };

        body.get("message")
            .and_then(text)
            .or_else(|| {
                body.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(text)
            })
            .or_else(|| body.get("error_description").and_then(text))
            .or_else(|| body.get("error").and_then(text))
            .or_else(|| body.get("errors").and_then(text))
            .or_else(|| body.get("raw_body").and_then(text))
            .unwrap_or_else(|| format!("Request failed with status {}", self.code))
    }
}
