//! Client configuration
//!
//! A [`ClientConfig`] is an immutable value handed to a client constructor.
//! There are no process-wide endpoint defaults: each vendor crate ships its
//! own [`Endpoints`] bundles (production, development, legacy) and starts the
//! builder from one of them.
//!
//! ```
//! use std::time::Duration;
//!
//! use skyport_common::auth::AuthScheme;
//! use skyport_common::config::{ClientConfig, Endpoints};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = Endpoints::parse("https://api.vendor.test/v2", "https://auth.vendor.test/token")?;
//! let config = ClientConfig::builder("my-api-key", endpoints)
//!     .client_id("vendor-sdk")
//!     .auth_scheme(AuthScheme::ApiKey)
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! assert_eq!(config.endpoints().base_url().as_str(), "https://api.vendor.test/v2/");
//! # Ok(())
//! # }
//! ```

pub mod loader;

use std::sync::Arc;
use std::time::Duration;

pub use loader::{load_from_env, load_from_file, load_from_lookup, ConfigOverrides};
use url::Url;

use crate::auth::{ApiKey, AuthScheme, DEFAULT_REFRESH_SKEW};
use crate::error::{ClientError, ClientResult};
use crate::time::{Clock, SystemClock};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resource base URL plus token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: Url,
    token_url: Url,
}

impl Endpoints {
    pub fn new(base_url: Url, token_url: Url) -> Self {
        Self { base_url: with_trailing_slash(base_url), token_url }
    }

    /// Parse both URLs
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if either URL is invalid.
    pub fn parse(base_url: &str, token_url: &str) -> ClientResult<Self> {
        Ok(Self::new(parse_url("base_url", base_url)?, parse_url("token_url", token_url)?))
    }

    /// Base URL, always ending in `/` so relative paths join beneath it
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Resolve a path relative to the base URL
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the joined URL is invalid.
    pub fn resolve(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("Invalid resource path '{path}': {e}")))
    }

    /// Append path segments to the base URL, percent-encoding each one
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the base URL cannot carry a path.
    pub fn resource<S: AsRef<str>>(&self, segments: &[S]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Config(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments.iter().map(AsRef::as_ref));
        Ok(url)
    }
}

/// Compile-time endpoint pair shipped by a vendor crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSet {
    pub base_url: &'static str,
    pub token_url: &'static str,
}

impl EndpointSet {
    /// Parse into [`Endpoints`]
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if either URL is invalid.
    pub fn to_endpoints(self) -> ClientResult<Endpoints> {
        Endpoints::parse(self.base_url, self.token_url)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub(crate) fn parse_url(field: &str, value: &str) -> ClientResult<Url> {
    Url::parse(value).map_err(|e| ClientError::Config(format!("Invalid {field} '{value}': {e}")))
}

/// Immutable settings for one client instance
#[derive(Clone)]
pub struct ClientConfig {
    api_key: ApiKey,
    endpoints: Endpoints,
    client_id: String,
    auth_scheme: AuthScheme,
    timeout: Duration,
    user_agent: String,
    refresh_skew: Duration,
    single_flight_refresh: bool,
    http_client: Option<reqwest::Client>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("endpoints", &self.endpoints)
            .field("client_id", &self.client_id)
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("refresh_skew", &self.refresh_skew)
            .field("single_flight_refresh", &self.single_flight_refresh)
            .field("custom_http_client", &self.http_client.is_some())
            .finish()
    }
}

impl ClientConfig {
    /// Start a builder from an API key and an endpoint bundle
    pub fn builder(api_key: impl Into<ApiKey>, endpoints: Endpoints) -> ClientConfigBuilder {
        ClientConfigBuilder {
            api_key: api_key.into(),
            endpoints,
            base_url: None,
            token_url: None,
            client_id: String::new(),
            auth_scheme: AuthScheme::Bearer,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            refresh_skew: DEFAULT_REFRESH_SKEW,
            single_flight_refresh: false,
            http_client: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn auth_scheme(&self) -> &AuthScheme {
        &self.auth_scheme
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn refresh_skew(&self) -> Duration {
        self.refresh_skew
    }

    pub fn single_flight_refresh(&self) -> bool {
        self.single_flight_refresh
    }

    /// Caller-supplied HTTP client, if any
    pub fn http_client(&self) -> Option<&reqwest::Client> {
        self.http_client.as_ref()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

fn default_user_agent() -> String {
    format!("skyport/{}", env!("CARGO_PKG_VERSION"))
}

/// Builder for [`ClientConfig`]
///
/// URL overrides are validated in [`build`](Self::build).
pub struct ClientConfigBuilder {
    api_key: ApiKey,
    endpoints: Endpoints,
    base_url: Option<String>,
    token_url: Option<String>,
    client_id: String,
    auth_scheme: AuthScheme,
    timeout: Duration,
    user_agent: String,
    refresh_skew: Duration,
    single_flight_refresh: bool,
    http_client: Option<reqwest::Client>,
    clock: Arc<dyn Clock>,
}

impl ClientConfigBuilder {
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<ApiKey>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Override the resource base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the token endpoint
    #[must_use]
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[must_use]
    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    /// Per-request timeout (token exchange included)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    #[must_use]
    pub fn single_flight_refresh(mut self, enabled: bool) -> Self {
        self.single_flight_refresh = enabled;
        self
    }

    /// Use a preconfigured HTTP client instead of building one
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply loaded overrides on top of the current settings
    #[must_use]
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(api_key) = overrides.api_key {
            self.api_key = ApiKey::new(api_key);
        }
        if let Some(base_url) = overrides.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(token_url) = overrides.token_url {
            self.token_url = Some(token_url);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = overrides.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(single_flight) = overrides.single_flight_refresh {
            self.single_flight_refresh = single_flight;
        }
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if a URL override does not parse, the
    /// timeout is zero, or the user agent is empty.
    pub fn build(self) -> ClientResult<ClientConfig> {
        let base_url = match self.base_url {
            Some(url) => parse_url("base_url", &url)?,
            None => self.endpoints.base_url.clone(),
        };
        let token_url = match self.token_url {
            Some(url) => parse_url("token_url", &url)?,
            None => self.endpoints.token_url.clone(),
        };

        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ClientError::Config("user_agent must not be empty".to_string()));
        }

        Ok(ClientConfig {
            api_key: self.api_key,
            endpoints: Endpoints::new(base_url, token_url),
            client_id: self.client_id,
            auth_scheme: self.auth_scheme,
            timeout: self.timeout,
            user_agent: self.user_agent,
            refresh_skew: self.refresh_skew,
            single_flight_refresh: self.single_flight_refresh,
            http_client: self.http_client,
            clock: self.clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::parse("https://api.vendor.test/v1", "https://auth.vendor.test/token").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder("key", endpoints()).build().unwrap();

        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.refresh_skew(), Duration::from_secs(300));
        assert_eq!(config.auth_scheme(), &AuthScheme::Bearer);
        assert!(!config.single_flight_refresh());
        assert!(config.http_client().is_none());
        assert!(config.user_agent().starts_with("skyport/"));
    }

    #[test]
    fn test_overrides_replace_bundle_urls() {
        let config = ClientConfig::builder("key", endpoints())
            .base_url("http://localhost:8080/api")
            .token_url("http://localhost:8080/token")
            .build()
            .unwrap();

        assert_eq!(config.endpoints().base_url().as_str(), "http://localhost:8080/api/");
        assert_eq!(config.endpoints().token_url().as_str(), "http://localhost:8080/token");
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let result = ClientConfig::builder("key", endpoints()).base_url("not a url").build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ClientConfig::builder("key", endpoints()).timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_resolve_joins_under_base_path() {
        let endpoints = endpoints();
        assert_eq!(
            endpoints.resolve("/tasking/orders").unwrap().as_str(),
            "https://api.vendor.test/v1/tasking/orders"
        );
        assert_eq!(
            endpoints.resolve("tasking/orders/abc").unwrap().as_str(),
            "https://api.vendor.test/v1/tasking/orders/abc"
        );
    }

    #[test]
    fn test_resource_encodes_segments() {
        let url = endpoints().resource(&["orders", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.vendor.test/v1/orders/a%20b%2Fc");
    }

    #[test]
    fn test_endpoint_set_parses() {
        let set = EndpointSet {
            base_url: "https://api.vendor.test/v1",
            token_url: "https://auth.vendor.test/token",
        };
        assert_eq!(set.to_endpoints().unwrap(), endpoints());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = ClientConfig::builder("very-secret", endpoints()).build().unwrap();
        assert!(!format!("{config:?}").contains("very-secret"));
    }

    #[test]
    fn test_apply_overrides() {
        let overrides = ConfigOverrides {
            api_key: Some("from-env".to_string()),
            timeout_secs: Some(5),
            single_flight_refresh: Some(true),
            ..Default::default()
        };

        let config = ClientConfig::builder("", endpoints()).apply(overrides).build().unwrap();

        assert_eq!(config.api_key().expose(), "from-env");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.single_flight_refresh());
    }
}
