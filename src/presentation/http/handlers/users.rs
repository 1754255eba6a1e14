//! User Handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::application::commands::{ConfirmCode, GetUsers, SignIn, SignUp};
use crate::application::dto::request::{ConfirmCodeRequest, ListUsersQuery, SignInRequest, SignUpRequest};
use crate::application::dto::response::{TokenResponse, UserResponse};
use crate::presentation::http::extractors::{CurrentUser, ValidatedJson, ValidatedQuery};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Register a new user and send a confirmation code
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state
        .mediator
        .dispatch_one(SignUp {
            username: body.username,
            phone: body.phone,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Confirm the phone number and receive a token
pub async fn confirm(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ConfirmCodeRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .mediator
        .dispatch_one(ConfirmCode {
            phone: body.phone,
            code: body.code,
        })
        .await?;

    Ok(Json(token.into()))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignInRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .mediator
        .dispatch_one(SignIn {
            phone: body.phone,
            password: body.password,
        })
        .await?;

    Ok(Json(token.into()))
}

/// List users, first page only
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .mediator
        .dispatch_one(GetUsers {
            user,
            limit: query.limit,
        })
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
