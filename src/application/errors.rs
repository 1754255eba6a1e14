//! Command Errors
//!
//! Every failure a command can produce. Domain and authorization failures
//! are expected outcomes; storage failures pass through untouched.

use super::services::AuthError;
use crate::domain::ValidationError;
use crate::shared::error::StorageError;

/// Failure returned from `Mediator::dispatch`.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User not found")]
    UserNotFound,

    #[error("User not confirmed")]
    UserNotConfirmed,

    #[error("User is blocked")]
    UserBlocked,

    #[error("Invalid token")]
    InvalidToken,

    #[error("This profile does not have the required permissions")]
    AccessDenied,

    #[error("A user with this number is already registered")]
    PhoneAlreadyRegistered,

    #[error("Code not verified")]
    CodeNotVerified,

    #[error("Password not verified")]
    PasswordNotVerified,

    #[error("Chat not found")]
    ChatNotFound,

    #[error("User is not a member of this chat")]
    NotChatMember,

    #[error("Chat member limit of {limit} reached")]
    ChatMemberLimitReached { limit: usize },

    #[error("Could not find handlers for the command: {0}")]
    HandlersNotRegistered(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// Whether this is an expected domain outcome rather than a defect or
    /// infrastructure failure.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            CommandError::HandlersNotRegistered(_)
                | CommandError::Storage(_)
                | CommandError::Internal(_)
        )
    }
}

impl From<AuthError> for CommandError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Storage(e) => CommandError::Storage(e),
            other => CommandError::Internal(other.to_string()),
        }
    }
}
