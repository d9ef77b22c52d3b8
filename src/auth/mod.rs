//! Authentication for outgoing requests.
//!
//! The runtime does not implement any login flow. It asks an
//! [`AuthProvider`] for headers before every attempt and, after a `401`,
//! gives it exactly one chance to refresh.
//!
//! # Overview
//!
//! - [`Credentials`]: bearer, basic, API key and OAuth2 credentials; usable
//!   directly as a provider
//! - [`AuthProvider`]: the provider trait
//! - [`TokenRefresher`]: a provider backed by an async refresh callback
//!
//! # Example
//!
//! ```rust
//! use fluent_rest::{ClientConfig, Credentials};
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.github.com")
//!     .credentials(Credentials::bearer("ghp_example").unwrap())
//!     .build()
//!     .unwrap();
//! ```

mod credentials;
mod provider;

pub use credentials::Credentials;
pub use provider::{AuthProvider, TokenRefresher};

use thiserror::Error;

/// Errors raised by a credential source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials could be produced.
    #[error("Credentials unavailable: {message}")]
    Unavailable {
        /// Why the credentials are unavailable.
        message: String,
    },

    /// Refreshing the credentials failed.
    #[error("Credential refresh failed: {message}")]
    Refresh {
        /// Why the refresh failed.
        message: String,
    },
}
