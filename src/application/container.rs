//! Mediator Container
//!
//! Wires every command to its handler. The finished mediator is checked with
//! `require` for each command type so a missing registration fails at
//! startup instead of on first use.

use std::sync::Arc;

use super::commands::*;
use super::errors::CommandError;
use super::mediator::Mediator;
use super::services::{AuthService, CodeSender};
use crate::domain::{ChatRepository, MessageRepository, UserRepository};

/// Collaborators the handlers are built from.
#[derive(Clone)]
pub struct Dependencies {
    pub users: Arc<dyn UserRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub auth: Arc<AuthService>,
    pub code_sender: Arc<dyn CodeSender>,
}

/// Tunables the handlers read.
#[derive(Debug, Clone, Copy)]
pub struct HandlerOptions {
    pub max_members: usize,
    pub users_page_size: usize,
    pub purge_memberships_on_block: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            max_members: 256,
            users_page_size: 10,
            purge_memberships_on_block: false,
        }
    }
}

/// Build the mediator with one handler per command.
pub fn build_mediator(deps: &Dependencies, options: HandlerOptions) -> Result<Mediator, CommandError> {
    let mut mediator = Mediator::new();

    mediator
        // users
        .register_handler::<SignUp, _>(SignUpHandler::new(
            deps.users.clone(),
            deps.auth.clone(),
            deps.code_sender.clone(),
        ))
        .register_handler::<ConfirmCode, _>(ConfirmCodeHandler::new(deps.users.clone(), deps.auth.clone()))
        .register_handler::<SignIn, _>(SignInHandler::new(deps.users.clone(), deps.auth.clone()))
        .register_handler::<GetUsers, _>(GetUsersHandler::new(deps.users.clone(), options.users_page_size))
        // permissions
        .register_handler::<AccessCheckUser, _>(AccessCheckUserHandler::new(
            deps.users.clone(),
            deps.auth.clone(),
        ))
        .register_handler::<AccessCheckModerator, _>(AccessCheckModeratorHandler::new(
            deps.users.clone(),
            deps.auth.clone(),
        ))
        // chats
        .register_handler::<CreateChat, _>(CreateChatHandler::new(deps.chats.clone()))
        .register_handler::<GetChat, _>(GetChatHandler::new(deps.chats.clone()))
        .register_handler::<CreateMessage, _>(CreateMessageHandler::new(
            deps.chats.clone(),
            deps.messages.clone(),
        ))
        .register_handler::<AddUserToChat, _>(AddUserToChatHandler::new(
            deps.users.clone(),
            deps.chats.clone(),
            options.max_members,
        ))
        .register_handler::<GetUserChats, _>(GetUserChatsHandler::new(deps.chats.clone()))
        .register_handler::<GetUserChatMessages, _>(GetUserChatMessagesHandler::new(
            deps.chats.clone(),
            deps.messages.clone(),
        ))
        // moderators
        .register_handler::<DeleteUser, _>(DeleteUserHandler::new(
            deps.users.clone(),
            deps.chats.clone(),
            options.purge_memberships_on_block,
        ));

    mediator
        .require::<SignUp>()?
        .require::<ConfirmCode>()?
        .require::<SignIn>()?
        .require::<GetUsers>()?
        .require::<AccessCheckUser>()?
        .require::<AccessCheckModerator>()?
        .require::<CreateChat>()?
        .require::<GetChat>()?
        .require::<CreateMessage>()?
        .require::<AddUserToChat>()?
        .require::<GetUserChats>()?
        .require::<GetUserChatMessages>()?
        .require::<DeleteUser>()?;

    tracing::info!(commands = ?mediator.registered_commands(), "Mediator ready");
    Ok(mediator)
}
