//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use reqwest::Url;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated API base URL.
///
/// The URL must be absolute and use the `http` or `https` scheme. Trailing
/// slashes are stripped so that paths can be appended with a single `/`.
///
/// # Example
///
/// ```rust
/// use fluent_rest::BaseUrl;
///
/// let url = BaseUrl::new("https://api.github.com/").unwrap();
/// assert_eq!(url.as_ref(), "https://api.github.com");
/// assert_eq!(url.host_name(), Some("api.github.com"));
/// assert_eq!(url.join("users/octocat"), "https://api.github.com/users/octocat");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl {
    url: String,
    host: Option<String>,
}

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL cannot be parsed,
    /// has no host, or does not use an http(s) scheme.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');

        let parsed =
            Url::parse(trimmed).map_err(|_| ConfigError::InvalidBaseUrl { url: url.clone() })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        Ok(Self {
            url: trimmed.to_string(),
            host: parsed.host_str().map(str::to_string),
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns `true` if `url` has the same scheme, host and port as the
    /// base URL. Unparseable URLs are never same-origin.
    #[must_use]
    pub fn same_origin(&self, url: &str) -> bool {
        let (Ok(base), Ok(other)) = (Url::parse(&self.url), Url::parse(url)) else {
            return false;
        };
        base.scheme() == other.scheme()
            && base.host_str() == other.host_str()
            && base.port_or_known_default() == other.port_or_known_default()
    }

    /// Appends a relative path to the base URL.
    ///
    /// Leading slashes on `path` are ignored.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{}", self.url, path)
        }
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A non-empty secret such as an access token, API key or password.
///
/// The `Debug` implementation masks the value so secrets never end up in
/// logs by accident.
///
/// # Example
///
/// ```rust
/// use fluent_rest::AccessToken;
///
/// let token = AccessToken::new("ghp_secret").unwrap();
/// assert_eq!(format!("{:?}", token), "AccessToken(*****)");
/// assert_eq!(token.as_ref(), "ghp_secret");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new validated token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyCredential { field: "token" });
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_strips_trailing_slashes() {
        let url = BaseUrl::new("https://api.spotify.com/v1//").unwrap();
        assert_eq!(url.as_ref(), "https://api.spotify.com/v1");
        assert_eq!(url.host_name(), Some("api.spotify.com"));
    }

    #[test]
    fn test_base_url_join_handles_leading_slash() {
        let url = BaseUrl::new("https://gitlab.com/api/v4").unwrap();
        assert_eq!(url.join("/projects"), "https://gitlab.com/api/v4/projects");
        assert_eq!(url.join("projects"), "https://gitlab.com/api/v4/projects");
        assert_eq!(url.join(""), "https://gitlab.com/api/v4");
    }

    #[test]
    fn test_base_url_accepts_localhost_with_port() {
        let url = BaseUrl::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(url.host_name(), Some("127.0.0.1"));
    }

    #[test]
    fn test_same_origin_compares_scheme_host_and_port() {
        let url = BaseUrl::new("https://api.github.com/v3").unwrap();
        assert!(url.same_origin("https://api.github.com/user/repos?page=2"));
        assert!(url.same_origin("https://api.github.com:443/user"));
        assert!(!url.same_origin("http://api.github.com/user"));
        assert!(!url.same_origin("https://evil.example.com/user"));
        assert!(!url.same_origin("https://api.github.com:8443/user"));
        assert!(!url.same_origin("not a url"));
    }

    #[test]
    fn test_base_url_rejects_invalid() {
        assert!(BaseUrl::new("api.github.com").is_err());
        assert!(BaseUrl::new("").is_err());
        assert!(BaseUrl::new("ftp://files.example.com").is_err());
        assert!(BaseUrl::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_base_url_deserializes_with_validation() {
        let url: BaseUrl = serde_json::from_str(r#""https://api.vercel.com/""#).unwrap();
        assert_eq!(url.as_ref(), "https://api.vercel.com");

        let bad: Result<BaseUrl, _> = serde_json::from_str(r#""nope""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_access_token_rejects_empty_string() {
        assert!(matches!(
            AccessToken::new(""),
            Err(ConfigError::EmptyCredential { field: "token" })
        ));
        assert!(AccessToken::new("   ").is_err());
    }

    #[test]
    fn test_access_token_masks_value_in_debug() {
        let token = AccessToken::new("super-secret").unwrap();
        let debug_output = format!("{token:?}");
        assert_eq!(debug_output, "AccessToken(*****)");
        assert!(!debug_output.contains("super-secret"));
    }
}
