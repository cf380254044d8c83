//! Integration tests using WireMock
//!
//! These tests drive the client against a mock Netatmo server over real HTTP:
//! token requests, token placement on GET and POST, and error classification.

mod endpoints;
mod session;

use std::sync::Arc;

use integrations_netatmo::{Credentials, MockScheduler, NetatmoClient, NetatmoConfig};
use serde_json::Value;
use wiremock::{MockServer, ResponseTemplate};

/// Start a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Build a client against `server`. Refresh timers never fire on their own.
pub fn client_for(server: &MockServer, credentials: Credentials) -> NetatmoClient {
    let config = NetatmoConfig::builder()
        .base_url(server.uri())
        .build()
        .expect("valid config");

    NetatmoClient::builder()
        .config(config)
        .credentials(credentials)
        .scheduler(Arc::new(MockScheduler::new()))
        .build()
        .expect("client builds")
}

/// Password grant credentials.
pub fn password_credentials() -> Credentials {
    Credentials::builder()
        .client_id("test-client")
        .client_secret("test-secret")
        .username("user@example.com")
        .password("pa ss")
        .build()
        .expect("valid credentials")
}

/// Success response wrapped in the `body` envelope.
pub fn envelope(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "body": body,
        "status": "ok",
        "time_exec": 0.01,
    }))
}

/// Error response template.
pub fn error_response(status: u16, error_body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body)
}
