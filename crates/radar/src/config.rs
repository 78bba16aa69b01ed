//! Endpoint bundles and configuration defaults for the radar API

use skyport_common::config::{load_from_env, ClientConfigBuilder};
use skyport_common::{ApiKey, AuthScheme, ClientConfig, ClientResult, EndpointSet};

/// `client_id` sent with every token exchange
pub const CLIENT_ID: &str = "radar-sdk";

/// Prefix for environment overrides (`SKYPORT_RADAR_API_KEY`, ...)
pub const ENV_PREFIX: &str = "SKYPORT_RADAR";

pub const PRODUCTION: EndpointSet = EndpointSet {
    base_url: "https://api.radar.skyport.example.com/v1",
    token_url: "https://auth.radar.skyport.example.com/oauth/token",
};

pub const DEVELOPMENT: EndpointSet = EndpointSet {
    base_url: "https://api.dev.radar.skyport.example.com/v1",
    token_url: "https://auth.dev.radar.skyport.example.com/oauth/token",
};

/// Pre-v1 deployment, still serving older accounts
pub const LEGACY: EndpointSet = EndpointSet {
    base_url: "https://legacy.radar.skyport.example.com/api/v0",
    token_url: "https://legacy.radar.skyport.example.com/auth/token",
};

/// Config builder preloaded with radar defaults for `endpoints`
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
        .auth_scheme(AuthScheme::Bearer)
        .user_agent(concat!("skyport-radar/", env!("CARGO_PKG_VERSION"))))
}

/// Production config with `SKYPORT_RADAR_*` environment overrides applied
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
            assert_eq!(config.auth_scheme(), &AuthScheme::Bearer);
        }
    }

    #[test]
    fn test_legacy_keeps_its_base_path() {
        let config = builder("key", LEGACY).unwrap().build().unwrap();
        assert_eq!(
            config.endpoints().resource(&["tasking", "orders"]).unwrap().as_str(),
            "https://legacy.radar.skyport.example.com/api/v0/tasking/orders"
        );
    }
}
