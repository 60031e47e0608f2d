use super::mocks::MockInference;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use textlens::{
    config::{DEFAULT_MAX_BODY_BYTES, EndpointTable, UpstreamConfig},
    gateway::Inference,
    server::{self, RateLimiter, handlers::AppState},
};

/// Upstream configuration pointing every task at `base`.
pub fn create_test_upstream_config(base: &str) -> UpstreamConfig {
    UpstreamConfig {
        api_key: "test-api-key".to_string(),
        timeout_secs: 5,
        endpoints: EndpointTable::with_base(base),
    }
}

/// Router backed by `gateway` with a generous rate limit.
pub fn create_test_app(gateway: Arc<dyn Inference>) -> Router {
    create_test_app_with_rate(gateway, "1000/m")
}

pub fn create_test_app_with_rate(gateway: Arc<dyn Inference>, rate: &str) -> Router {
    create_test_app_with_limits(gateway, rate, DEFAULT_MAX_BODY_BYTES)
}

pub fn create_test_app_with_limits(
    gateway: Arc<dyn Inference>,
    rate: &str,
    body_limit: usize,
) -> Router {
    let state = AppState { gateway };
    let limiter = Arc::new(RateLimiter::new(rate.parse().unwrap()));
    server::router(state, limiter, body_limit)
}

pub fn create_mock_app() -> (Router, MockInference) {
    let mock = MockInference::new();
    (create_test_app(Arc::new(mock.clone())), mock)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090
  logs:
    level: "debug"
  rate_limit: "20/h"
upstream:
  api_key: "file-key"
  timeout_secs: 10
  endpoints:
    summarize: "http://localhost:1/sum"
    translate: "http://localhost:1/tr"
    analyze: "http://localhost:1/an"
"#;
