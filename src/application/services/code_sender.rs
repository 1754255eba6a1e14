//! Outbound confirmation-code delivery.

use async_trait::async_trait;

use crate::domain::User;
use crate::shared::error::StorageError;

/// Delivers a confirmation code to a user, e.g. over SMS.
///
/// Invoked once per sign-up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(&self, user: &User, code: &str) -> Result<(), StorageError>;
}
