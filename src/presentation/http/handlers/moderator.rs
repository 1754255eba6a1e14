//! Moderator Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::application::commands::DeleteUser;
use crate::presentation::http::extractors::CurrentModerator;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Soft-delete (block) a user
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentModerator(moderator): CurrentModerator,
    Path(user_oid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .mediator
        .dispatch_one(DeleteUser { moderator, user_oid })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
