//! Permission pipeline.
//!
//! Protected operations take two round-trips through the mediator: one of
//! these commands turns a bearer token into a `User`, and that user is then
//! placed into the command being guarded.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::mediator::{Command, CommandHandler};
use crate::application::services::AuthService;
use crate::domain::{User, UserRepository};

#[derive(Debug, Clone)]
pub struct AccessCheckUser {
    pub token: String,
}

impl Command for AccessCheckUser {
    type Output = User;
}

#[derive(Debug, Clone)]
pub struct AccessCheckModerator {
    pub token: String,
}

impl Command for AccessCheckModerator {
    type Output = User;
}

/// Verify the token and load its subject.
async fn resolve_subject(
    auth: &AuthService,
    users: &dyn UserRepository,
    token: &str,
) -> Result<User, CommandError> {
    let claims = auth.verify_token(token).ok_or(CommandError::InvalidToken)?;

    users
        .get_by_oid(claims.sub)
        .await?
        .ok_or(CommandError::UserNotFound)
}

pub struct AccessCheckUserHandler {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl AccessCheckUserHandler {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }
}

#[async_trait]
impl CommandHandler<AccessCheckUser> for AccessCheckUserHandler {
    async fn handle(&self, command: &AccessCheckUser) -> Result<User, CommandError> {
        let user = resolve_subject(&self.auth, self.users.as_ref(), &command.token).await?;

        if !user.is_confirmed {
            return Err(CommandError::UserNotConfirmed);
        }
        if user.is_blocked {
            return Err(CommandError::UserBlocked);
        }

        Ok(user)
    }
}

pub struct AccessCheckModeratorHandler {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl AccessCheckModeratorHandler {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }
}

#[async_trait]
impl CommandHandler<AccessCheckModerator> for AccessCheckModeratorHandler {
    async fn handle(&self, command: &AccessCheckModerator) -> Result<User, CommandError> {
        let user = resolve_subject(&self.auth, self.users.as_ref(), &command.token).await?;

        if !user.is_moderator || user.is_blocked {
            return Err(CommandError::AccessDenied);
        }

        Ok(user)
    }
}
