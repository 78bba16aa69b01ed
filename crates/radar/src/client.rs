//! Radar API client
//!
//! Operation methods live next to their wire types in [`crate::tasking`],
//! [`crate::feasibility`] and [`crate::compute`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use skyport_common::{ApiKey, ClientConfig, ClientResult, RequestExecutor, TokenAuthenticator};
use tracing::debug;

use crate::config::{self, DEVELOPMENT, LEGACY, PRODUCTION};

/// Client for the SAR tasking API
///
/// Cheap to clone; clones share the connection pool and access token.
#[derive(Debug, Clone)]
pub struct RadarClient {
    pub(crate) executor: RequestExecutor,
    auth: Arc<TokenAuthenticator>,
}

impl RadarClient {
    /// Client for the production endpoints
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, PRODUCTION)?.build()?)
    }

    /// Client for the development endpoints
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn development(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, DEVELOPMENT)?.build()?)
    }

    /// Client for the legacy (v0) endpoints
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn legacy(api_key: impl Into<ApiKey>) -> ClientResult<Self> {
        Self::with_config(config::builder(api_key, LEGACY)?.build()?)
    }

    /// Client for production with `SKYPORT_RADAR_*` overrides
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if an environment
    /// value is invalid.
    pub fn from_env() -> ClientResult<Self> {
        Self::with_config(config::from_env()?)
    }

    /// Client for an explicit configuration
    ///
    /// Use [`config::builder`] to start from a radar endpoint bundle.
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the HTTP client
    /// cannot be built.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let (executor, auth) = RequestExecutor::connect(&config)?;
        debug!(base_url = %config.endpoints().base_url(), "radar client created");
        Ok(Self { executor, auth })
    }

    /// Expiry of the cached access token, `None` before the first call
    pub fn credential_expiry(&self) -> Option<DateTime<Utc>> {
        self.auth.credential_expiry()
    }

    /// Drop the cached access token; the next call exchanges a new one
    pub fn invalidate_credential(&self) {
        self.auth.invalidate();
    }
}
