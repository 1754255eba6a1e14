//! Code Sender Adapters

use async_trait::async_trait;

use crate::application::services::CodeSender;
use crate::domain::User;
use crate::shared::error::StorageError;

/// Writes the code to the log instead of delivering it.
///
/// Used until a real SMS gateway is wired in.
#[derive(Debug, Default, Clone)]
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(&self, user: &User, code: &str) -> Result<(), StorageError> {
        tracing::info!(
            user_oid = %user.oid,
            phone = %user.phone(),
            code,
            "Confirmation code issued"
        );
        Ok(())
    }
}
