//! Custom Extractors
//!
//! Bearer authentication through the permission pipeline, and JSON/query
//! extraction with `validator` checks.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json, RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::application::commands::{AccessCheckModerator, AccessCheckUser};
use crate::domain::User;
use crate::shared::error::AppError;
use crate::startup::AppState;

async fn bearer_token(parts: &mut Parts) -> Result<String, AppError> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthorized("Missing authorization header".into()))?;

    Ok(bearer.token().to_owned())
}

/// Confirmed, unblocked user behind the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).await?;
        let user = state.mediator.dispatch_one(AccessCheckUser { token }).await?;

        Ok(CurrentUser(user))
    }
}

/// Moderator behind the bearer token
#[derive(Debug, Clone)]
pub struct CurrentModerator(pub User);

impl FromRequestParts<AppState> for CurrentModerator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).await?;
        let moderator = state.mediator.dispatch_one(AccessCheckModerator { token }).await?;

        Ok(CurrentModerator(moderator))
    }
}

/// JSON body that passed `Validate`
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

/// Query string that passed `Validate`
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(ValidatedQuery(value))
    }
}
