//! Endpoint bundles and configuration defaults for the optical API

use skyport_common::config::{load_from_env, ClientConfigBuilder};
use skyport_common::{ApiKey, AuthScheme, ClientConfig, ClientResult, EndpointSet};

/// `client_id` sent with every token exchange
pub const CLIENT_ID: &str = "optical-sdk";

/// Prefix for environment overrides (`SKYPORT_OPTICAL_API_KEY`, ...)
pub const ENV_PREFIX: &str = "SKYPORT_OPTICAL";

pub const PRODUCTION: EndpointSet = EndpointSet {
    base_url: "https://api.optical.skyport.example.com/v1",
    token_url: "https://auth.optical.skyport.example.com/oauth/token",
};

pub const DEVELOPMENT: EndpointSet = EndpointSet {
    base_url: "https://api.dev.optical.skyport.example.com/v1",
    token_url: "https://auth.dev.optical.skyport.example.com/oauth/token",
};

/// Previous API generation, kept for accounts not yet migrated
pub const LEGACY: EndpointSet = EndpointSet {
    base_url: "https://legacy.optical.skyport.example.com/api/v0",
    token_url: "https://legacy.optical.skyport.example.com/auth/token",
};

/// Config builder preloaded with optical defaults for `endpoints`
///
/// # Errors
/// Returns [`skyport_common::ClientError::Config`] if the bundle URLs do not
/// parse.
pub fn builder(
    api_key: impl Into<ApiKey>,
    endpoints: EndpointSet,
) -> ClientResult<ClientConfigBuilder> {
    Ok(ClientConfig::builder(api_key, endpoints.to_endpoints()?)
        .client_id(CLIENT_ID)
        .auth_scheme(AuthScheme::ApiKey)
        .user_agent(concat!("skyport-optical/", env!("CARGO_PKG_VERSION"))))
}

/// Production config with `SKYPORT_OPTICAL_*` environment overrides applied
///
/// # Errors
/// Returns [`skyport_common::ClientError::Config`] if an environment value is
/// invalid.
pub fn from_env() -> ClientResult<ClientConfig> {
    builder("", PRODUCTION)?.apply(load_from_env(ENV_PREFIX)?).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundles_parse() {
        for set in [PRODUCTION, DEVELOPMENT, LEGACY] {
            let config = builder("key", set).unwrap().build().unwrap();
            assert_eq!(config.client_id(), CLIENT_ID);
            assert_eq!(config.auth_scheme(), &AuthScheme::ApiKey);
        }
    }

    #[test]
    fn test_token_formatted_with_api_key_word() {
        let config = builder("key", PRODUCTION).unwrap().build().unwrap();
        let value = config.auth_scheme().header_value("tok").unwrap();
        assert_eq!(value.to_str().unwrap(), "api-key tok");
        assert!(config.user_agent().starts_with("skyport-optical/"));
    }
}
