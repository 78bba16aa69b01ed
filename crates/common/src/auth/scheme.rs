//! Authorization header scheme and API key wrapper

use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::AuthError;

/// Scheme word placed before the token in the `Authorization` header
///
/// Chosen once per vendor when the authenticator is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// `Bearer <token>`
    #[default]
    Bearer,
    /// `api-key <token>`
    ApiKey,
    /// `<word> <token>`
    Custom(String),
}

impl AuthScheme {
    pub fn word(&self) -> &str {
        match self {
            Self::Bearer => "Bearer",
            Self::ApiKey => "api-key",
            Self::Custom(word) => word,
        }
    }

    /// Format a token into a sensitive header value
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidHeaderValue`] if the token contains bytes
    /// that are not allowed in a header.
    pub fn header_value(&self, token: &str) -> Result<HeaderValue, AuthError> {
        let mut value = HeaderValue::from_str(&format!("{} {token}", self.word()))
            .map_err(|_| AuthError::InvalidHeaderValue)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

/// Long-lived API key exchanged for bearer tokens
///
/// Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_per_scheme() {
        let bearer = AuthScheme::Bearer.header_value("abc").unwrap();
        assert_eq!(bearer.to_str().unwrap(), "Bearer abc");
        assert!(bearer.is_sensitive());

        let api_key = AuthScheme::ApiKey.header_value("abc").unwrap();
        assert_eq!(api_key.to_str().unwrap(), "api-key abc");

        let custom = AuthScheme::Custom("Token".to_string()).header_value("abc").unwrap();
        assert_eq!(custom.to_str().unwrap(), "Token abc");
    }

    #[test]
    fn test_header_value_rejects_control_characters() {
        let result = AuthScheme::Bearer.header_value("bad\ntoken");
        assert!(matches!(result, Err(AuthError::InvalidHeaderValue)));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("my-secret-key");
        assert_eq!(format!("{key:?}"), "ApiKey(<redacted>)");
        assert_eq!(key.expose(), "my-secret-key");
        assert!(ApiKey::new("  ").is_empty());
    }
}
