//! HTTP-specific error types.
//!
//! Every expected failure of a request is reported through [`HttpError`];
//! nothing in the request path panics or throws. Each variant can be viewed
//! through the uniform `{ message, status_code, details }` shape via
//! [`HttpError::message`], [`HttpError::status_code`] and
//! [`HttpError::details`], and classified with [`HttpError::kind`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_rest::{ErrorKind, HttpError};
//!
//! match client.path("user").get::<serde_json::Value>(RequestOptions::new()).await {
//!     Ok(user) => println!("{user}"),
//!     Err(error) if error.kind() == ErrorKind::Authentication => {
//!         println!("check your token: {}", error.message());
//!     }
//!     Err(HttpError::RateLimited(e)) => {
//!         println!("slow down, retry after {:?}", e.retry_after);
//!     }
//!     Err(error) => println!("request failed: {error}"),
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthError;

/// Error returned when a request receives a non-successful response that is
/// not retried.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("HTTP {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// A human readable message extracted from the response body.
    pub message: String,
    /// The parsed response body, if any.
    pub details: Option<serde_json::Value>,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub error_reference: Option<String>,
}

/// Error returned when the retry budget for transient failures is exhausted.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Exceeded maximum retry count of {retries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The status code of the last response, or `None` after a network error.
    pub code: Option<u16>,
    /// The number of retries that were attempted.
    pub retries: u32,
    /// Message describing the last failure.
    pub message: String,
    /// The parsed body of the last response, if any.
    pub details: Option<serde_json::Value>,
}

/// Error returned when the server keeps answering `429 Too Many Requests`.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Rate limited by server after {retries} retries: {message}")]
pub struct RateLimitedError {
    /// The number of retries that were attempted.
    pub retries: u32,
    /// The server's `Retry-After` value, if it sent one.
    pub retry_after: Option<Duration>,
    /// Message extracted from the last response.
    pub message: String,
    /// The parsed body of the last response, if any.
    pub details: Option<serde_json::Value>,
}

/// Error returned when a request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The resolved path is empty.
    #[error("Cannot send a request without a path.")]
    EmptyPath,

    /// A body was supplied for a verb that does not carry one.
    #[error("Cannot send a body with {method}.")]
    BodyNotAllowed {
        /// The HTTP method.
        method: String,
    },

    /// A `{placeholder}` in a catalog path had no matching argument.
    #[error("Missing path parameter '{name}' for '{template}'.")]
    MissingPathParameter {
        /// The placeholder name.
        name: String,
        /// The path template.
        template: String,
    },

    /// The catalog has no resource with this name.
    #[error("Unknown resource '{name}'.")]
    UnknownResource {
        /// The resource name.
        name: String,
    },

    /// The catalog resource has no method with this name.
    #[error("Resource '{resource}' has no method '{method}'.")]
    UnknownMethod {
        /// The resource name.
        resource: String,
        /// The method name.
        method: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The header name.
        name: String,
    },
}

/// Broad classification of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network errors and retryable statuses; already retried.
    Transient,
    /// `401` after the single re-authentication attempt, or a credential
    /// source failure.
    Authentication,
    /// Invalid requests and non-retryable `4xx` responses. Never retried.
    Client,
    /// Non-retryable `5xx` responses.
    Server,
    /// The server kept answering `429`.
    RateLimit,
    /// The body did not match the expected shape.
    Decode,
    /// The caller aborted the request.
    Cancelled,
}

/// Unified error type for all request failures.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response that is not retried.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Retry attempts exhausted on transient failures.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// The server rate limited the request.
    #[error(transparent)]
    RateLimited(#[from] RateLimitedError),

    /// The server rejected the credentials, even after refreshing them.
    #[error("Unauthorized: {0}")]
    Unauthorized(HttpResponseError),

    /// The credential source failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error on a request without retries.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the requested type.
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request was cancelled before it completed.
    #[error("Request was cancelled")]
    Cancelled,
}

impl HttpError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Response(e) if e.code >= 500 => ErrorKind::Server,
            Self::Response(_) | Self::InvalidRequest(_) => ErrorKind::Client,
            Self::MaxRetries(_) | Self::Network(_) => ErrorKind::Transient,
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::Unauthorized(_) | Self::Auth(_) => ErrorKind::Authentication,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns a human readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns the HTTP status code associated with this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response(e) | Self::Unauthorized(e) => Some(e.code),
            Self::MaxRetries(e) => e.code,
            Self::RateLimited(_) => Some(429),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the parsed response body associated with this error, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Response(e) | Self::Unauthorized(e) => e.details.as_ref(),
            Self::MaxRetries(e) => e.details.as_ref(),
            Self::RateLimited(e) => e.details.as_ref(),
            _ => None,
        }
    }

    /// Returns the server's `Retry-After` value for rate-limit errors.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(e) => e.retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_error(code: u16) -> HttpResponseError {
        HttpResponseError {
            code,
            message: "Not Found".to_string(),
            details: Some(json!({"message": "Not Found"})),
            error_reference: Some("abc-123".to_string()),
        }
    }

    #[test]
    fn test_http_response_error_includes_status_code_in_message() {
        assert_eq!(response_error(404).to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn test_max_retries_error_includes_retry_count() {
        let error = MaxHttpRetriesExceededError {
            code: Some(503),
            retries: 3,
            message: "Service Unavailable".to_string(),
            details: None,
        };
        let message = error.to_string();
        assert!(message.contains("3"));
        assert!(message.contains("Exceeded maximum retry count"));
    }

    #[test]
    fn test_error_shape_accessors() {
        let error = HttpError::Response(response_error(404));
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.details(), Some(&json!({"message": "Not Found"})));
        assert!(error.message().contains("Not Found"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(HttpError::Response(response_error(422)).kind(), ErrorKind::Client);
        assert_eq!(HttpError::Response(response_error(500)).kind(), ErrorKind::Server);
        assert_eq!(
            HttpError::Unauthorized(response_error(401)).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            HttpError::InvalidRequest(InvalidHttpRequestError::EmptyPath).kind(),
            ErrorKind::Client
        );
        assert_eq!(HttpError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_rate_limited_surfaces_retry_after() {
        let error = HttpError::RateLimited(RateLimitedError {
            retries: 3,
            retry_after: Some(Duration::from_secs(30)),
            message: "slow down".to_string(),
            details: None,
        });
        assert_eq!(error.kind(), ErrorKind::RateLimit);
        assert_eq!(error.status_code(), Some(429));
        assert_eq!(error.retry_after(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_path_parameter_message() {
        let error = InvalidHttpRequestError::MissingPathParameter {
            name: "owner".to_string(),
            template: "repos/{owner}/{repo}".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing path parameter 'owner' for 'repos/{owner}/{repo}'."
        );
    }

    #[test]
    fn test_error_types_implement_std_error() {
        let _: &dyn std::error::Error = &response_error(400);
        let _: &dyn std::error::Error = &InvalidHttpRequestError::EmptyPath;
        let _: &dyn std::error::Error = &HttpError::Cancelled;
    }
}
