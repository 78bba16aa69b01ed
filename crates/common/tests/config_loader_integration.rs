//! Integration tests for configuration overrides
//!
//! Loads overrides from files and environment lookups and applies them on top
//! of an endpoint bundle.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use skyport_common::config::{self, ClientConfig, ConfigOverrides, Endpoints};
use skyport_common::ClientError;
use tempfile::Builder;

fn bundle() -> Endpoints {
    Endpoints::parse("https://api.vendor.test/v1", "https://auth.vendor.test/oauth/token").unwrap()
}

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_overrides_from_toml_file() {
    let file = write_temp(
        ".toml",
        r#"
            api_key = "toml-key"
            base_url = "http://localhost:8080/api"
            timeout_secs = 12
            single_flight_refresh = true
        "#,
    );

    let overrides = config::load_from_file(file.path()).unwrap();
    let config = ClientConfig::builder("", bundle()).apply(overrides).build().unwrap();

    assert_eq!(config.api_key().expose(), "toml-key");
    assert_eq!(config.endpoints().base_url().as_str(), "http://localhost:8080/api/");
    assert_eq!(config.endpoints().token_url().as_str(), "https://auth.vendor.test/oauth/token");
    assert_eq!(config.timeout(), Duration::from_secs(12));
    assert!(config.single_flight_refresh());
}

#[test]
fn test_load_overrides_from_json_file() {
    let file = write_temp(
        ".json",
        r#"{"token_url": "http://localhost:9000/token", "user_agent": "ops-script/1.0"}"#,
    );

    let overrides = config::load_from_file(file.path()).unwrap();
    assert_eq!(
        overrides,
        ConfigOverrides {
            token_url: Some("http://localhost:9000/token".to_string()),
            user_agent: Some("ops-script/1.0".to_string()),
            ..Default::default()
        }
    );

    let config = ClientConfig::builder("key", bundle()).apply(overrides).build().unwrap();
    assert_eq!(config.user_agent(), "ops-script/1.0");
}

#[test]
fn test_unknown_keys_are_rejected() {
    let file = write_temp(".json", r#"{"base_uri": "http://typo"}"#);

    let result = config::load_from_file(file.path());
    assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("Invalid JSON")));
}

#[test]
fn test_missing_file_is_config_error() {
    let result = config::load_from_file("/nonexistent/skyport.toml");
    assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("not found")));
}

#[test]
fn test_invalid_url_override_fails_at_build() {
    let file = write_temp(".toml", r#"base_url = "::not a url::""#);

    let overrides = config::load_from_file(file.path()).unwrap();
    let result = ClientConfig::builder("key", bundle()).apply(overrides).build();

    assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("base_url")));
}

#[test]
fn test_environment_lookup_overrides() {
    let vars: HashMap<&str, &str> = [
        ("SKYPORT_RADAR_API_KEY", "env-key"),
        ("SKYPORT_RADAR_TIMEOUT_SECS", "45"),
        ("SKYPORT_OPTICAL_API_KEY", "other-vendor"),
    ]
    .into_iter()
    .collect();

    let overrides =
        config::load_from_lookup("SKYPORT_RADAR", |name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();
    let config = ClientConfig::builder("", bundle()).apply(overrides).build().unwrap();

    assert_eq!(config.api_key().expose(), "env-key");
    assert_eq!(config.timeout(), Duration::from_secs(45));
    assert_eq!(config.endpoints(), &bundle());
}
