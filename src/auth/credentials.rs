//! Credential values and the headers they produce.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::config::AccessToken;
use crate::error::ConfigError;

/// Credentials for one of the supported authentication schemes.
///
/// Secrets are held in [`AccessToken`]s so they are masked in `Debug` output.
///
/// # Example
///
/// ```rust
/// use fluent_rest::Credentials;
///
/// let creds = Credentials::bearer("ghp_example").unwrap();
/// let headers = creds.headers();
/// assert_eq!(headers.get("Authorization").unwrap(), "Bearer ghp_example");
///
/// let creds = Credentials::api_key("X-Api-Key", "k-123").unwrap();
/// assert_eq!(creds.headers().get("X-Api-Key").unwrap(), "k-123");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Anonymous access; no headers are added.
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer(AccessToken),
    /// `Authorization: Basic base64(username:password)`.
    Basic {
        /// The user name.
        username: String,
        /// The password or personal access token.
        password: AccessToken,
    },
    /// A key sent in a custom header such as `X-Api-Key` or `PRIVATE-TOKEN`.
    ApiKey {
        /// The header name.
        header: String,
        /// The key.
        key: AccessToken,
    },
    /// An OAuth2 access token, optionally expiring.
    OAuth2 {
        /// The access token.
        access_token: AccessToken,
        /// The token type used in the `Authorization` header (usually `Bearer`).
        token_type: String,
        /// When the token expires, if known.
        expires_at: Option<DateTime<Utc>>,
    },
}

impl Credentials {
    /// Creates bearer credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if `token` is empty.
    pub fn bearer(token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::Bearer(AccessToken::new(token)?))
    }

    /// Creates HTTP basic credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if either part is empty.
    pub fn basic(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::EmptyCredential { field: "username" });
        }
        let password = AccessToken::new(password)
            .map_err(|_| ConfigError::EmptyCredential { field: "password" })?;
        Ok(Self::Basic { username, password })
    }

    /// Creates API key credentials sent in `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if the header name or key is
    /// empty.
    pub fn api_key(header: impl Into<String>, key: impl Into<String>) -> Result<Self, ConfigError> {
        let header = header.into();
        if header.trim().is_empty() {
            return Err(ConfigError::EmptyCredential { field: "header" });
        }
        let key =
            AccessToken::new(key).map_err(|_| ConfigError::EmptyCredential { field: "key" })?;
        Ok(Self::ApiKey { header, key })
    }

    /// Creates non-expiring OAuth2 bearer credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if `access_token` is empty.
    pub fn oauth2(access_token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::OAuth2 {
            access_token: AccessToken::new(access_token)?,
            token_type: "Bearer".to_string(),
            expires_at: None,
        })
    }

    /// Sets the expiry of OAuth2 credentials. Other schemes are unchanged.
    #[must_use]
    pub fn expiring_at(self, at: DateTime<Utc>) -> Self {
        match self {
            Self::OAuth2 {
                access_token,
                token_type,
                ..
            } => Self::OAuth2 {
                access_token,
                token_type,
                expires_at: Some(at),
            },
            other => other,
        }
    }

    /// Returns `true` if these are OAuth2 credentials past their expiry.
    ///
    /// Credentials without an expiry never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        match self {
            Self::OAuth2 {
                expires_at: Some(at),
                ..
            } => Utc::now() >= *at,
            _ => false,
        }
    }

    /// Returns the headers these credentials add to a request.
    #[must_use]
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        match self {
            Self::None => {}
            Self::Bearer(token) => {
                headers.insert(
                    "Authorization".to_string(),
                    format!("Bearer {}", token.as_ref()),
                );
            }
            Self::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{}", password.as_ref()));
                headers.insert("Authorization".to_string(), format!("Basic {encoded}"));
            }
            Self::ApiKey { header, key } => {
                headers.insert(header.clone(), key.as_ref().to_string());
            }
            Self::OAuth2 {
                access_token,
                token_type,
                ..
            } => {
                headers.insert(
                    "Authorization".to_string(),
                    format!("{token_type} {}", access_token.as_ref()),
                );
            }
        }
        headers
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            Self::None => "none",
            Self::Bearer(_) => "bearer",
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "apikey",
            Self::OAuth2 { .. } => "oauth2",
        };
        f.write_str(scheme)
    }
}

// Verify Credentials is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credentials>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_basic_header_is_base64_encoded() {
        let creds = Credentials::basic("octocat", "hunter2").unwrap();
        assert_eq!(
            creds.headers().get("Authorization").unwrap(),
            "Basic b2N0b2NhdDpodW50ZXIy"
        );
    }

    #[test]
    fn test_oauth2_uses_token_type() {
        let creds = Credentials::oauth2("abc").unwrap();
        assert_eq!(creds.headers().get("Authorization").unwrap(), "Bearer abc");
        assert_eq!(creds.to_string(), "oauth2");
    }

    #[test]
    fn test_none_adds_no_headers() {
        assert!(Credentials::None.headers().is_empty());
    }

    #[test]
    fn test_empty_credentials_are_rejected() {
        assert!(matches!(
            Credentials::bearer(""),
            Err(ConfigError::EmptyCredential { field: "token" })
        ));
        assert!(matches!(
            Credentials::basic("", "pw"),
            Err(ConfigError::EmptyCredential { field: "username" })
        ));
        assert!(matches!(
            Credentials::basic("user", ""),
            Err(ConfigError::EmptyCredential { field: "password" })
        ));
        assert!(matches!(
            Credentials::api_key(" ", "k"),
            Err(ConfigError::EmptyCredential { field: "header" })
        ));
    }

    #[test]
    fn test_oauth2_expiry() {
        let expired = Credentials::oauth2("abc")
            .unwrap()
            .expiring_at(Utc::now() - Duration::hours(1));
        assert!(expired.expired());

        let valid = Credentials::oauth2("abc")
            .unwrap()
            .expiring_at(Utc::now() + Duration::hours(1));
        assert!(!valid.expired());

        assert!(!Credentials::bearer("abc").unwrap().expired());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let creds = Credentials::bearer("very-secret").unwrap();
        assert!(!format!("{creds:?}").contains("very-secret"));
    }
}
