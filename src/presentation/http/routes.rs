//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::track_http_metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // Real-time chat stream, one connection per chat
        .route("/ws/chats/{chat_oid}", get(ws_handler))
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_http_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/chats", chat_routes())
        .nest("/moderator", moderator_routes())
}

/// Sign-up and sign-in are public; listing requires a confirmed user
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(handlers::users::sign_up))
        .route("/confirm", post(handlers::users::confirm))
        .route("/sign-in", post(handlers::users::sign_in))
        .route("/", get(handlers::users::list_users))
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::chats::list_chats).post(handlers::chats::create_chat),
        )
        .route("/{chat_oid}", get(handlers::chats::get_chat))
        .route(
            "/{chat_oid}/messages",
            get(handlers::chats::get_messages).post(handlers::chats::send_message),
        )
        .route("/{chat_oid}/members", post(handlers::chats::add_member))
}

fn moderator_routes() -> Router<AppState> {
    Router::new().route("/users/{user_oid}", delete(handlers::moderator::delete_user))
}
