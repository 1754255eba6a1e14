//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Command dispatches by command type and outcome
//! - Active WebSocket sessions
//! - WebSocket broadcast deliveries

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace("chat_backend"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace("chat_backend")
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Command dispatch counter by command type and outcome ("ok", "error")
pub static COMMANDS_DISPATCHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("commands_dispatched_total", "Total number of dispatched commands")
            .namespace("chat_backend"),
        &["command", "outcome"],
    )
    .expect("Failed to create COMMANDS_DISPATCHED_TOTAL metric")
});

/// Sessions currently joined to a chat
pub static WEBSOCKET_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_sessions_active",
            "Number of WebSocket sessions joined to a chat",
        )
        .namespace("chat_backend"),
    )
    .expect("Failed to create WEBSOCKET_SESSIONS_ACTIVE metric")
});

/// Payloads successfully queued to a session by a broadcast
pub static WEBSOCKET_BROADCAST_DELIVERIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "websocket_broadcast_deliveries_total",
            "Total number of broadcast payloads delivered to sessions",
        )
        .namespace("chat_backend"),
    )
    .expect("Failed to create WEBSOCKET_BROADCAST_DELIVERIES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(COMMANDS_DISPATCHED_TOTAL.clone()))
        .expect("Failed to register COMMANDS_DISPATCHED_TOTAL");
    registry
        .register(Box::new(WEBSOCKET_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_SESSIONS_ACTIVE");
    registry
        .register(Box::new(WEBSOCKET_BROADCAST_DELIVERIES_TOTAL.clone()))
        .expect("Failed to register WEBSOCKET_BROADCAST_DELIVERIES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record one command dispatch
pub fn record_command(command: &str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    COMMANDS_DISPATCHED_TOTAL
        .with_label_values(&[command, outcome])
        .inc();
}

pub fn websocket_session_opened() {
    WEBSOCKET_SESSIONS_ACTIVE.inc();
}

pub fn websocket_session_closed() {
    WEBSOCKET_SESSIONS_ACTIVE.dec();
}

pub fn record_broadcast_deliveries(count: usize) {
    WEBSOCKET_BROADCAST_DELIVERIES_TOTAL.inc_by(count as u64);
}
