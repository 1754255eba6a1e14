//! Chat and message commands.
//!
//! Every command here carries a `User` already resolved by the permission
//! pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::errors::CommandError;
use crate::application::mediator::{Command, CommandHandler};
use crate::domain::{
    Chat, ChatRepository, MemberAddition, Message, MessageRepository, Text, Title, User,
    UserRepository,
};

/// Load a chat the user belongs to.
async fn member_chat(chats: &dyn ChatRepository, chat_oid: Uuid, user: &User) -> Result<Chat, CommandError> {
    let chat = chats
        .get_by_oid(chat_oid)
        .await?
        .ok_or(CommandError::ChatNotFound)?;

    if !chat.has_member(user.oid) {
        return Err(CommandError::NotChatMember);
    }
    Ok(chat)
}

#[derive(Debug, Clone)]
pub struct CreateChat {
    pub title: String,
    pub user: User,
}

impl Command for CreateChat {
    type Output = Chat;
}

pub struct CreateChatHandler {
    chats: Arc<dyn ChatRepository>,
}

impl CreateChatHandler {
    pub fn new(chats: Arc<dyn ChatRepository>) -> Self {
        Self { chats }
    }
}

#[async_trait]
impl CommandHandler<CreateChat> for CreateChatHandler {
    async fn handle(&self, command: &CreateChat) -> Result<Chat, CommandError> {
        let title = Title::new(command.title.as_str())?;
        let chat = Chat::create(title, &command.user);
        self.chats.add(&chat).await?;

        info!(chat_oid = %chat.oid, user_oid = %command.user.oid, "Chat created");
        Ok(chat)
    }
}

/// A chat, visible only to its members.
#[derive(Debug, Clone)]
pub struct GetChat {
    pub chat_oid: Uuid,
    pub user: User,
}

impl Command for GetChat {
    type Output = Chat;
}

pub struct GetChatHandler {
    chats: Arc<dyn ChatRepository>,
}

impl GetChatHandler {
    pub fn new(chats: Arc<dyn ChatRepository>) -> Self {
        Self { chats }
    }
}

#[async_trait]
impl CommandHandler<GetChat> for GetChatHandler {
    async fn handle(&self, command: &GetChat) -> Result<Chat, CommandError> {
        member_chat(self.chats.as_ref(), command.chat_oid, &command.user).await
    }
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub text: String,
    pub chat_oid: Uuid,
    pub user: User,
}

impl Command for CreateMessage {
    type Output = Message;
}

pub struct CreateMessageHandler {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl CreateMessageHandler {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }
}

#[async_trait]
impl CommandHandler<CreateMessage> for CreateMessageHandler {
    async fn handle(&self, command: &CreateMessage) -> Result<Message, CommandError> {
        let text = Text::new(command.text.as_str())?;
        let chat = member_chat(self.chats.as_ref(), command.chat_oid, &command.user).await?;

        let message = Message::new(text, command.user.oid, chat.oid);
        self.messages.add(&message).await?;

        debug!(chat_oid = %chat.oid, message_oid = %message.oid, "Message stored");
        Ok(message)
    }
}

/// Invite `user_oid` into a chat the acting user belongs to.
#[derive(Debug, Clone)]
pub struct AddUserToChat {
    pub user_oid: Uuid,
    pub chat_oid: Uuid,
    pub user: User,
}

impl Command for AddUserToChat {
    type Output = Chat;
}

pub struct AddUserToChatHandler {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    max_members: usize,
}

impl AddUserToChatHandler {
    pub fn new(users: Arc<dyn UserRepository>, chats: Arc<dyn ChatRepository>, max_members: usize) -> Self {
        Self {
            users,
            chats,
            max_members,
        }
    }
}

#[async_trait]
impl CommandHandler<AddUserToChat> for AddUserToChatHandler {
    async fn handle(&self, command: &AddUserToChat) -> Result<Chat, CommandError> {
        let invited = self
            .users
            .get_by_oid(command.user_oid)
            .await?
            .ok_or(CommandError::UserNotFound)?;

        let chat = member_chat(self.chats.as_ref(), command.chat_oid, &command.user).await?;
        if chat.has_member(invited.oid) {
            return Ok(chat);
        }

        match self.chats.add_member(chat.oid, invited.oid, self.max_members).await? {
            MemberAddition::Added => {
                info!(chat_oid = %chat.oid, user_oid = %invited.oid, "User added to chat");
            }
            MemberAddition::AlreadyMember => {}
            MemberAddition::LimitReached => {
                return Err(CommandError::ChatMemberLimitReached {
                    limit: self.max_members,
                });
            }
            MemberAddition::ChatMissing => return Err(CommandError::ChatNotFound),
        }

        self.chats
            .get_by_oid(chat.oid)
            .await?
            .ok_or(CommandError::ChatNotFound)
    }
}

#[derive(Debug, Clone)]
pub struct GetUserChats {
    pub user: User,
}

impl Command for GetUserChats {
    type Output = Vec<Chat>;
}

pub struct GetUserChatsHandler {
    chats: Arc<dyn ChatRepository>,
}

impl GetUserChatsHandler {
    pub fn new(chats: Arc<dyn ChatRepository>) -> Self {
        Self { chats }
    }
}

#[async_trait]
impl CommandHandler<GetUserChats> for GetUserChatsHandler {
    async fn handle(&self, command: &GetUserChats) -> Result<Vec<Chat>, CommandError> {
        Ok(self.chats.list_by_member(command.user.oid).await?)
    }
}

#[derive(Debug, Clone)]
pub struct GetUserChatMessages {
    pub user: User,
    pub chat_oid: Uuid,
}

impl Command for GetUserChatMessages {
    type Output = Vec<Message>;
}

pub struct GetUserChatMessagesHandler {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl GetUserChatMessagesHandler {
    pub fn new(chats: Arc<dyn ChatRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { chats, messages }
    }
}

#[async_trait]
impl CommandHandler<GetUserChatMessages> for GetUserChatMessagesHandler {
    async fn handle(&self, command: &GetUserChatMessages) -> Result<Vec<Message>, CommandError> {
        let chat = member_chat(self.chats.as_ref(), command.chat_oid, &command.user).await?;
        Ok(self.messages.list_by_chat(chat.oid).await?)
    }
}
