//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::application::services::AccessToken;
use crate::domain::{Chat, Message, User};

/// Access token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub oid: Uuid,
    pub username: String,
    pub phone: String,
    pub is_confirmed: bool,
    pub is_blocked: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            oid: user.oid,
            phone: user.phone().to_string(),
            username: user.username.into(),
            is_confirmed: user.is_confirmed,
            is_blocked: user.is_blocked,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub oid: Uuid,
    pub title: String,
    pub members: Vec<Uuid>,
    pub created_at: String,
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self {
            oid: chat.oid,
            members: chat.members().to_vec(),
            title: chat.title.into(),
            created_at: chat.created_at.to_rfc3339(),
        }
    }
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub oid: Uuid,
    pub chat_oid: Uuid,
    pub sender_oid: Uuid,
    pub text: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            oid: message.oid,
            chat_oid: message.chat_oid,
            sender_oid: message.sender_oid,
            text: message.text.into(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}
