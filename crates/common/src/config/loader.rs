//! Configuration overrides from environment variables or files
//!
//! Vendor crates pick a prefix (`SKYPORT_RADAR`, `SKYPORT_OPTICAL`) and
//! layer whatever is found here on top of their default endpoint bundle.
//!
//! ## Environment Variables
//! - `<PREFIX>_API_KEY`: API key exchanged for access tokens
//! - `<PREFIX>_BASE_URL`: Resource base URL
//! - `<PREFIX>_TOKEN_URL`: Token endpoint
//! - `<PREFIX>_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `<PREFIX>_USER_AGENT`: `User-Agent` header value
//! - `<PREFIX>_SINGLE_FLIGHT_REFRESH`: Coalesce token refreshes (true/false)
//!
//! ## Files
//! JSON and TOML are supported, detected by file extension. Keys match the
//! field names of [`ConfigOverrides`]; every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Partial settings; `None` leaves the builder value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub token_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub single_flight_refresh: Option<bool>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Read overrides from process environment variables
///
/// # Errors
/// Returns [`ClientError::Config`] if a numeric or boolean variable has an
/// invalid value.
pub fn load_from_env(prefix: &str) -> ClientResult<ConfigOverrides> {
    load_from_lookup(prefix, |name| std::env::var(name).ok())
}

/// Read overrides through an arbitrary variable lookup
///
/// Empty values are treated as unset.
///
/// # Errors
/// Returns [`ClientError::Config`] if a numeric or boolean variable has an
/// invalid value.
pub fn load_from_lookup<F>(prefix: &str, lookup: F) -> ClientResult<ConfigOverrides>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        lookup(&format!("{prefix}_{suffix}")).filter(|value| !value.trim().is_empty())
    };

    let timeout_secs = var("TIMEOUT_SECS")
        .map(|s| {
            s.trim().parse::<u64>().map_err(|e| {
                ClientError::Config(format!("Invalid {prefix}_TIMEOUT_SECS '{s}': {e}"))
            })
        })
        .transpose()?;

    let single_flight_refresh = var("SINGLE_FLIGHT_REFRESH")
        .map(|s| parse_bool(&s).ok_or_else(|| {
            ClientError::Config(format!("Invalid {prefix}_SINGLE_FLIGHT_REFRESH '{s}'"))
        }))
        .transpose()?;

    let overrides = ConfigOverrides {
        api_key: var("API_KEY"),
        base_url: var("BASE_URL"),
        token_url: var("TOKEN_URL"),
        timeout_secs,
        user_agent: var("USER_AGENT"),
        single_flight_refresh,
    };

    tracing::debug!(prefix, found = !overrides.is_empty(), "Loaded environment overrides");
    Ok(overrides)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read overrides from a JSON or TOML file
///
/// # Errors
/// Returns [`ClientError::Config`] if the file is missing or unreadable, the
/// extension is unsupported, or the content does not parse.
pub fn load_from_file(path: impl AsRef<Path>) -> ClientResult<ConfigOverrides> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ClientError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading client configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ClientError::Config(format!("Failed to read config file: {e}")))?;

    parse_overrides(&contents, path)
}

fn parse_overrides(contents: &str, path: &Path) -> ClientResult<ConfigOverrides> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ClientError::Config(format!("Unsupported config format: {extension}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_lookup_reads_prefixed_variables() {
        let overrides = load_from_lookup(
            "SKYPORT_TEST",
            lookup(&[
                ("SKYPORT_TEST_API_KEY", "abc"),
                ("SKYPORT_TEST_BASE_URL", "http://localhost:9000"),
                ("SKYPORT_TEST_TIMEOUT_SECS", "12"),
                ("SKYPORT_TEST_SINGLE_FLIGHT_REFRESH", "yes"),
                ("OTHER_API_KEY", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(overrides.api_key.as_deref(), Some("abc"));
        assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(overrides.timeout_secs, Some(12));
        assert_eq!(overrides.single_flight_refresh, Some(true));
        assert_eq!(overrides.token_url, None);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let overrides =
            load_from_lookup("P", lookup(&[("P_API_KEY", "  "), ("P_USER_AGENT", "")])).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let result = load_from_lookup("P", lookup(&[("P_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("P_TIMEOUT_SECS")));
    }

    #[test]
    fn test_invalid_bool_is_config_error() {
        let result = load_from_lookup("P", lookup(&[("P_SINGLE_FLIGHT_REFRESH", "maybe")]));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = parse_overrides("", Path::new("client.yaml"));
        assert!(matches!(result, Err(ClientError::Config(msg)) if msg.contains("yaml")));
    }
}
