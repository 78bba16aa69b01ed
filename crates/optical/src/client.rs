//! Optical imagery API client

use std::sync::Arc;

use chrono::{DateTime, Utc};
use skyport_common::{ApiKey, ClientConfig, ClientResult, RequestExecutor, TokenAuthenticator};
use tracing::debug;

use crate::config::{self, DEVELOPMENT, LEGACY, PRODUCTION};

/// Client for the imagery ordering API
///
/// Shopcart operations are in [`crate::shopcart`], order tracking in
/// [`crate::orders`]. Clones share the access token.
#[derive(Debug, Clone)]
pub struct OpticalClient {
    pub(crate) executor: RequestExecutor,
    auth: Arc<TokenAuthenticator>,
}

impl OpticalClient {
    /// Client for the production endpoints
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, PRODUCTION)?.build()?)
    }

    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn development(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, DEVELOPMENT)?.build()?)
    }

    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn legacy(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, LEGACY)?.build()?)
    }

    /// Client for production with `SKYPORT_OPTICAL_*` overrides
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if an environment
    /// value is invalid.
    pub fn from_env() -> ClientResult<Self> {
        Self::with_config(config::from_env()?)
    }

    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the HTTP client
    /// cannot be built.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let (executor, auth) = RequestExecutor::connect(&config)?;
        debug!(base_url = %config.endpoints().base_url(), "optical client created");
        Ok(Self { executor, auth })
    }

    pub fn credential_expiry(&self) -> Option<DateTime<Utc>> {
        self.auth.credential_expiry()
    }

    pub fn invalidate_credential(&self) {
        self.auth.invalidate();
    }
}
