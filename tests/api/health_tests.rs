//! Health and Metrics Endpoint Tests

use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_with_memory_backends() {
    let app = TestApp::new().await;

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert!(body["checks"].get("database").is_none());
    assert!(body["checks"].get("redis").is_none());
    assert_eq!(body["checks"]["websocket"]["active_sessions"], 0);
}

#[tokio::test]
async fn test_metrics_exposes_command_counters() {
    let app = TestApp::new().await;
    app.sign_up("alice", "+79010000000").await;

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("chat_backend_commands_dispatched_total"));
    assert!(text.contains("command=\"SignUp\""));
}
