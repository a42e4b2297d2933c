#![allow(dead_code)]

use std::sync::Once;
use trex_client::{Client, ClientConfig};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";

static LOGGING: Once = Once::new();

/// Log to the test output, filtered with LOG_LEVEL (default to WARN)
pub fn init_logging() {
    LOGGING.call_once(|| {
        let env_filter = match std::env::var("LOG_LEVEL") {
            Ok(log_level) => EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(log_level),
            Err(_) => EnvFilter::new("warn"),
        };
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .init();
    });
}

/// Client pointed at the mock server under `/trex`
pub fn client_for(server: &MockServer) -> Client {
    init_logging();
    let config = ClientConfig::new()
        .with_api_key(API_KEY)
        .with_base_url(format!("{}/trex", server.uri()));
    Client::from_config(config).unwrap()
}

/// Every call to `/trex/{endpoint}` carrying the test key gets `status` and `body`
pub async fn mock_endpoint(
    endpoint: &str,
    status: u16,
    body: serde_json::Value,
) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/trex/{endpoint}")))
        .and(header("X-API-Key", API_KEY))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

pub async fn mock_generate(status: u16, body: serde_json::Value) -> MockServer {
    mock_endpoint("generate", status, body).await
}

/// JSON bodies of every request the server received
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json().unwrap())
        .collect()
}
