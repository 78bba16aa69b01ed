//! Authentication for vendor resource endpoints
//!
//! - [`credential`]: bearer token + expiry, and the lock-protected store
//! - [`scheme`]: header scheme strategy (`Bearer`, `api-key`, custom) and the
//!   redacted [`ApiKey`]
//! - [`authenticator`]: API-key exchange with lazy, skew-aware refresh
//!
//! The request executor only sees the [`AccessTokenProvider`] trait, so tests
//! and callers holding pre-issued tokens can plug in [`StaticTokenProvider`].

pub mod authenticator;
pub mod credential;
pub mod scheme;

use async_trait::async_trait;
pub use authenticator::{TokenAuthenticator, TokenAuthenticatorBuilder, DEFAULT_REFRESH_SKEW};
pub use credential::{Credential, CredentialStore};
use reqwest::header::HeaderValue;
pub use scheme::{ApiKey, AuthScheme};
use tokio_util::sync::CancellationToken;

use crate::error::ClientResult;

/// Trait for providing `Authorization` header values
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a header value backed by a currently valid token
    ///
    /// Implementations refresh as needed.
    async fn authorization(&self, cancel: &CancellationToken) -> ClientResult<HeaderValue>;
}

#[async_trait]
impl AccessTokenProvider for TokenAuthenticator {
    async fn authorization(&self, cancel: &CancellationToken) -> ClientResult<HeaderValue> {
        let credential = self.ensure_valid(cancel).await?;
        self.header_value(&credential)
    }
}

/// Provider for a token obtained out of band
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    scheme: AuthScheme,
    token: String,
}

impl StaticTokenProvider {
    pub fn new(scheme: AuthScheme, token: impl Into<String>) -> Self {
        Self { scheme, token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn authorization(&self, _cancel: &CancellationToken) -> ClientResult<HeaderValue> {
        Ok(self.scheme.header_value(&self.token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new(AuthScheme::ApiKey, "test-token");

        let value = provider.authorization(&CancellationToken::new()).await.unwrap();
        assert_eq!(value.to_str().unwrap(), "api-key test-token");
    }
}
