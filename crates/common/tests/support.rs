#![allow(dead_code, unused_imports)]

use std::sync::Arc;

use serde_json::{json, Value};
use skyport_common::config::{ClientConfig, ClientConfigBuilder};
pub use skyport_common::testing::{token_mock, TOKEN_PATH};
use skyport_common::{Clock, RequestExecutor, TokenAuthenticator};
use wiremock::MockServer;

pub const CLIENT_ID: &str = "integration-sdk";

/// Config builder pointed at `server`, ready for per-test overrides.
pub fn builder(server: &MockServer) -> ClientConfigBuilder {
    skyport_common::testing::test_config(server, CLIENT_ID)
}

pub fn config(server: &MockServer) -> ClientConfig {
    builder(server).build().expect("config should build")
}

/// Executor plus authenticator wired against a mock server.
pub fn connect(server: &MockServer) -> (RequestExecutor, Arc<TokenAuthenticator>) {
    RequestExecutor::connect(&config(server)).expect("executor should build")
}

/// Same as [`connect`] with a caller-controlled clock.
pub fn connect_with_clock(
    server: &MockServer,
    clock: Arc<dyn Clock>,
) -> (RequestExecutor, Arc<TokenAuthenticator>) {
    let config = builder(server).clock(clock).build().expect("config should build");
    RequestExecutor::connect(&config).expect("executor should build")
}

pub fn order(id: &str, status: &str) -> Value {
    json!({"id": id, "status": status})
}
