//! The auth header provider seam.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::auth::{AuthError, Credentials};

/// Supplies authentication headers for outgoing requests.
///
/// `auth_headers` is called once per attempt and its result is never cached
/// by the runtime. `refresh` is called at most once per request, after a
/// `401`; returning `Ok(true)` tells the executor that retrying with fresh
/// headers is worthwhile.
#[async_trait]
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// Returns the headers to add to the next request.
    async fn auth_headers(&self) -> Result<HashMap<String, String>, AuthError>;

    /// Obtains fresh credentials after the server rejected the current ones.
    ///
    /// The default implementation cannot refresh and returns `Ok(false)`.
    async fn refresh(&self) -> Result<bool, AuthError> {
        Ok(false)
    }
}

#[async_trait]
impl AuthProvider for Credentials {
    async fn auth_headers(&self) -> Result<HashMap<String, String>, AuthError> {
        Ok(self.headers())
    }
}

type RefreshFn = dyn Fn() -> BoxFuture<'static, Result<Credentials, AuthError>> + Send + Sync;

/// An [`AuthProvider`] that obtains new credentials from an async callback.
///
/// The callback runs when the server answers `401` and, proactively, when
/// the current OAuth2 credentials have expired. How the callback gets a
/// token (refresh grant, client credentials, a secrets store) is up to the
/// caller.
///
/// # Example
///
/// ```rust
/// use fluent_rest::auth::{AuthError, TokenRefresher};
/// use fluent_rest::Credentials;
///
/// let provider = TokenRefresher::new(Credentials::oauth2("initial").unwrap(), || async {
///     // Exchange a refresh token here.
///     Credentials::oauth2("refreshed").map_err(|e| AuthError::Refresh {
///         message: e.to_string(),
///     })
/// });
/// ```
pub struct TokenRefresher {
    current: RwLock<Credentials>,
    refresh_fn: Arc<RefreshFn>,
}

impl TokenRefresher {
    /// Creates a provider starting from `initial` credentials.
    pub fn new<F, Fut>(initial: Credentials, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Credentials, AuthError>> + Send + 'static,
    {
        Self {
            current: RwLock::new(initial),
            refresh_fn: Arc::new(move || refresh().boxed()),
        }
    }

    /// Returns a copy of the credentials currently in use.
    #[must_use]
    pub fn current(&self) -> Credentials {
        self.current
            .read()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |guard| guard.clone())
    }

    fn store(&self, credentials: Credentials) {
        match self.current.write() {
            Ok(mut guard) => *guard = credentials,
            Err(poisoned) => *poisoned.into_inner() = credentials,
        }
    }

    async fn fetch(&self) -> Result<(), AuthError> {
        let credentials = (self.refresh_fn)().await?;
        tracing::debug!("Obtained fresh {} credentials", credentials);
        self.store(credentials);
        Ok(())
    }
}

impl fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for TokenRefresher {
    async fn auth_headers(&self) -> Result<HashMap<String, String>, AuthError> {
        if self.current().expired() {
            self.fetch().await?;
        }
        Ok(self.current().headers())
    }

    async fn refresh(&self) -> Result<bool, AuthError> {
        self.fetch().await?;
        Ok(true)
    }
}
