//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe; checks whichever backends are configured

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

/// Checks for configured backends; the in-memory backends have none.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ServiceHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<ServiceHealth>,
    pub websocket: WebSocketHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebSocketHealth {
    pub active_sessions: usize,
    pub active_chats: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Returns 503 when a configured backend is unreachable
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db {
        Some(pool) => Some(check_database(pool).await),
        None => None,
    };
    let redis = match &state.redis {
        Some(conn) => Some(check_redis(conn.clone()).await),
        None => None,
    };

    let overall_status = determine_overall_status(database.as_ref(), redis.as_ref());

    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            database,
            redis,
            websocket: WebSocketHealth {
                active_sessions: state.registry.total_sessions(),
                active_chats: state.registry.chat_count(),
            },
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

async fn check_database(pool: &sqlx::PgPool) -> ServiceHealth {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: if latency < 100 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Database connection failed: {}", e)),
        },
    }
}

async fn check_redis(mut conn: redis::aio::ConnectionManager) -> ServiceHealth {
    let start = Instant::now();
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: if latency < 50 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Redis connection failed: {}", e)),
        },
    }
}

/// Worst status among the configured backends
fn determine_overall_status(db: Option<&ServiceHealth>, redis: Option<&ServiceHealth>) -> HealthStatus {
    let statuses = [db, redis].into_iter().flatten().map(|check| check.status);

    statuses.fold(HealthStatus::Healthy, |overall, status| match (overall, status) {
        (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
        (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    })
}
