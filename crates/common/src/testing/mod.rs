//! Testing utilities for client crates
//!
//! Enabled with the `test-utils` feature. Provides:
//! - wiremock helpers for the token endpoint
//! - a [`ClientConfig`] pointed at a mock server
//! - a controllable [`MockClock`] (re-exported from [`crate::time`])
//! - [`init_tracing`] for log output in tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skyport_common::testing::{mount_token_endpoint, test_config};
//! use wiremock::MockServer;
//!
//! # async fn example() {
//! let server = MockServer::start().await;
//! mount_token_endpoint(&server, "tok-1", 3600).await;
//! let config = test_config(&server, "vendor-sdk").build().unwrap();
//! # }
//! ```

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use crate::time::{Clock, MockClock, SystemClock};
use crate::config::{ClientConfig, ClientConfigBuilder, Endpoints};

/// Path the token endpoint is mounted under
pub const TOKEN_PATH: &str = "/oauth/token";

/// API key used by [`test_config`]
pub const TEST_API_KEY: &str = "test-api-key";

/// Successful token response body
pub fn token_body(token: &str, expires_in: i64) -> Value {
    json!({
        "access_token": token,
        "expires_in": expires_in,
        "token_type": "Bearer",
    })
}

/// Mock answering every token request with the same token
pub fn token_mock(token: &str, expires_in: i64) -> Mock {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
}

/// Mount a token endpoint on `server`
pub async fn mount_token_endpoint(server: &MockServer, token: &str, expires_in: i64) {
    token_mock(token, expires_in).mount(server).await;
}

/// Mount a token endpoint that must be hit exactly `times` times
///
/// Verified when the server is dropped.
pub async fn mount_token_endpoint_expecting(
    server: &MockServer,
    token: &str,
    expires_in: i64,
    times: u64,
) {
    token_mock(token, expires_in).expect(times).mount(server).await;
}

/// Endpoints pointing both base and token URL at `server`
#[allow(clippy::missing_panics_doc, clippy::expect_used)]
pub fn mock_endpoints(server: &MockServer) -> Endpoints {
    Endpoints::parse(&server.uri(), &format!("{}{TOKEN_PATH}", server.uri()))
        .expect("mock server URI is a valid URL")
}

/// Config builder for a client talking to `server`
pub fn test_config(server: &MockServer, client_id: &str) -> ClientConfigBuilder {
    ClientConfig::builder(TEST_API_KEY, mock_endpoints(server)).client_id(client_id)
}

/// Install a test subscriber honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
