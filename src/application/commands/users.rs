//! Account commands: registration, confirmation, sign-in and listing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::application::errors::CommandError;
use crate::application::mediator::{Command, CommandHandler};
use crate::application::services::{AccessToken, AuthService, CodeSender};
use crate::domain::{Credentials, Password, Phone, User, UserRepository, Username};
use crate::shared::error::StorageError;

#[derive(Debug, Clone)]
pub struct SignUp {
    pub username: String,
    pub phone: String,
    pub password: String,
}

impl Command for SignUp {
    type Output = User;
}

pub struct SignUpHandler {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
    sender: Arc<dyn CodeSender>,
}

impl SignUpHandler {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>, sender: Arc<dyn CodeSender>) -> Self {
        Self { users, auth, sender }
    }
}

#[async_trait]
impl CommandHandler<SignUp> for SignUpHandler {
    async fn handle(&self, command: &SignUp) -> Result<User, CommandError> {
        let username = Username::new(command.username.as_str())?;
        let phone = Phone::new(command.phone.as_str())?;
        let password = Password::new(command.password.as_str())?;

        if self.users.get_by_phone(&phone).await?.is_some() {
            return Err(CommandError::PhoneAlreadyRegistered);
        }

        let password_hash = self.auth.hash_password(&password).await?;
        let user = User::new(username, Credentials { phone, password_hash });
        // the lookup above races with concurrent sign-ups; the store has the final word
        match self.users.add(&user).await {
            Err(StorageError::Conflict(_)) => return Err(CommandError::PhoneAlreadyRegistered),
            result => result?,
        }

        let code = self.auth.generate_confirmation_code();
        self.auth.save_confirmation_code(user.phone(), &code).await?;
        self.sender.send_code(&user, &code).await?;

        info!(user_oid = %user.oid, "User signed up");
        Ok(user)
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmCode {
    pub phone: String,
    pub code: String,
}

impl Command for ConfirmCode {
    type Output = AccessToken;
}

pub struct ConfirmCodeHandler {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl ConfirmCodeHandler {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }
}

#[async_trait]
impl CommandHandler<ConfirmCode> for ConfirmCodeHandler {
    async fn handle(&self, command: &ConfirmCode) -> Result<AccessToken, CommandError> {
        let phone = Phone::new(command.phone.as_str())?;

        let mut user = self
            .users
            .get_by_phone(&phone)
            .await?
            .ok_or(CommandError::UserNotFound)?;

        if !self.auth.check_confirmation_code(&phone, &command.code).await? {
            return Err(CommandError::CodeNotVerified);
        }

        self.users.mark_confirmed(user.oid).await?;
        self.auth.delete_confirmation_code(&phone).await?;
        user.confirm();

        info!(user_oid = %user.oid, "User confirmed");
        Ok(self.auth.issue_token(&user)?)
    }
}

#[derive(Debug, Clone)]
pub struct SignIn {
    pub phone: String,
    pub password: String,
}

impl Command for SignIn {
    type Output = AccessToken;
}

pub struct SignInHandler {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl SignInHandler {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }
}

#[async_trait]
impl CommandHandler<SignIn> for SignInHandler {
    async fn handle(&self, command: &SignIn) -> Result<AccessToken, CommandError> {
        let phone = Phone::new(command.phone.as_str())?;

        let user = self
            .users
            .get_by_phone(&phone)
            .await?
            .ok_or(CommandError::UserNotFound)?;

        if !user.is_confirmed {
            return Err(CommandError::UserNotConfirmed);
        }
        if user.is_blocked {
            return Err(CommandError::UserBlocked);
        }

        let verified = self
            .auth
            .verify_password(&command.password, &user.credentials.password_hash)
            .await?;
        if !verified {
            return Err(CommandError::PasswordNotVerified);
        }

        Ok(self.auth.issue_token(&user)?)
    }
}

/// First page of users. `limit` falls back to the configured page size.
#[derive(Debug, Clone)]
pub struct GetUsers {
    pub user: User,
    pub limit: Option<usize>,
}

impl Command for GetUsers {
    type Output = Vec<User>;
}

pub struct GetUsersHandler {
    users: Arc<dyn UserRepository>,
    page_size: usize,
}

impl GetUsersHandler {
    pub fn new(users: Arc<dyn UserRepository>, page_size: usize) -> Self {
        Self { users, page_size }
    }
}

#[async_trait]
impl CommandHandler<GetUsers> for GetUsersHandler {
    async fn handle(&self, command: &GetUsers) -> Result<Vec<User>, CommandError> {
        let limit = command.limit.unwrap_or(self.page_size);
        Ok(self.users.list(limit).await?)
    }
}
