//! Moderator commands.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::errors::CommandError;
use crate::application::mediator::{Command, CommandHandler};
use crate::domain::{ChatRepository, User, UserRepository};

/// Soft-delete a user. `moderator` comes from `AccessCheckModerator`.
#[derive(Debug, Clone)]
pub struct DeleteUser {
    pub moderator: User,
    pub user_oid: Uuid,
}

impl Command for DeleteUser {
    type Output = ();
}

pub struct DeleteUserHandler {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    purge_memberships: bool,
}

impl DeleteUserHandler {
    pub fn new(users: Arc<dyn UserRepository>, chats: Arc<dyn ChatRepository>, purge_memberships: bool) -> Self {
        Self {
            users,
            chats,
            purge_memberships,
        }
    }
}

#[async_trait]
impl CommandHandler<DeleteUser> for DeleteUserHandler {
    async fn handle(&self, command: &DeleteUser) -> Result<(), CommandError> {
        if !command.moderator.is_moderator {
            return Err(CommandError::AccessDenied);
        }

        if !self.users.soft_delete(command.user_oid).await? {
            warn!(user_oid = %command.user_oid, "Delete requested for unknown user");
            return Ok(());
        }

        let purged = if self.purge_memberships {
            self.chats.remove_member_from_all(command.user_oid).await?
        } else {
            0
        };

        info!(
            user_oid = %command.user_oid,
            moderator_oid = %command.moderator.oid,
            purged_chats = purged,
            "User blocked"
        );
        Ok(())
    }
}
