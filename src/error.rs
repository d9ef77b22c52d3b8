//! Configuration error types.
//!
//! Configuration defects are the one class of failure that surfaces outside
//! the [`HttpError`](crate::clients::HttpError) channel: they are reported by
//! constructors and builders, before any request is made.
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("not a url");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL could not be parsed or has an unsupported scheme.
    #[error("Invalid base URL '{url}'. Expected an absolute http(s) URL such as 'https://api.github.com'.")]
    InvalidBaseUrl {
        /// The URL that was provided.
        url: String,
    },

    /// An access token, API key or password was empty.
    #[error("Credential '{field}' cannot be empty.")]
    EmptyCredential {
        /// The name of the empty credential field.
        field: &'static str,
    },

    /// A rate limit preset name is not known.
    #[error("Unknown rate limit preset '{name}'. Known presets: {known}.")]
    UnknownRateLimitPreset {
        /// The name that was provided.
        name: String,
        /// Comma separated list of known preset names.
        known: String,
    },

    /// A numeric setting must be greater than zero.
    #[error("Invalid value for '{field}': must be greater than zero.")]
    ZeroValue {
        /// The name of the offending setting.
        field: &'static str,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The header name.
        name: String,
    },

    /// The underlying HTTP client could not be created.
    #[error("Failed to create HTTP client: {message}")]
    HttpClient {
        /// The reason reported by the HTTP stack.
        message: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_error_message() {
        let error = ConfigError::InvalidBaseUrl {
            url: "ftp://nope".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ftp://nope"));
        assert!(message.contains("absolute http(s) URL"));
    }

    #[test]
    fn test_unknown_preset_lists_known_names() {
        let error = ConfigError::UnknownRateLimitPreset {
            name: "myspace".to_string(),
            known: "github, spotify".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("myspace"));
        assert!(message.contains("github, spotify"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "base_url" };
        let message = error.to_string();
        assert!(message.contains("base_url"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::ZeroValue {
            field: "max_requests",
        };
        let _: &dyn std::error::Error = &error;
    }
}
