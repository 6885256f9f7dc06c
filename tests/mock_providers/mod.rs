//! Mock Watson servers for integration tests.
//!
//! REST endpoints are mocked with `wiremock`; the recognize WebSocket is a
//! small `tokio-tungstenite` server speaking the Watson streaming protocol.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod websocket_mock;

use watson_sdk::config::ServiceConfig;

pub const USERNAME: &str = "batman";
pub const PASSWORD: &str = "bruce-wayne";

/// Base64 of `batman:bruce-wayne`.
pub const BASIC_AUTH: &str = "Basic YmF0bWFuOmJydWNlLXdheW5l";

/// Credentials pointing at a mock server.
pub fn mock_config(url: impl Into<String>) -> ServiceConfig {
    ServiceConfig::new(url).with_basic_auth(USERNAME, PASSWORD)
}
