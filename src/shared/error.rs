//! Application Error Types
//!
//! `StorageError` is what repositories and caches fail with. `AppError` is the
//! HTTP-facing error; command failures are mapped onto it here so the core
//! never knows about status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::CommandError;

/// Infrastructure failure from a repository or cache backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Internal(String),
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl From<CommandError> for AppError {
    fn from(error: CommandError) -> Self {
        let message = error.to_string();
        if error.is_domain() {
            tracing::debug!(error = %message, "Command rejected");
        }
        match error {
            CommandError::Validation(_) => AppError::Validation(message),
            CommandError::UserNotFound | CommandError::ChatNotFound => AppError::NotFound(message),
            CommandError::InvalidToken
            | CommandError::UserNotConfirmed
            | CommandError::CodeNotVerified
            | CommandError::PasswordNotVerified => AppError::Unauthorized(message),
            CommandError::AccessDenied
            | CommandError::UserBlocked
            | CommandError::NotChatMember => AppError::Forbidden(message),
            CommandError::PhoneAlreadyRegistered | CommandError::ChatMemberLimitReached { .. } => {
                AppError::Conflict(message)
            }
            CommandError::HandlersNotRegistered(_)
            | CommandError::Storage(_)
            | CommandError::Internal(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, 10003, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, 10004, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, 10005, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, 10007, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}
