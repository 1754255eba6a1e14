//! WebSocket Message Types
//!
//! Server frames use a `{ "type": ..., "payload": ... }` envelope. Client
//! frames are plain UTF-8 text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Close codes (RFC 6455 section 7.4.1)
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const UNSUPPORTED_DATA: u16 = 1003;
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// Outgoing server event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Greeting after the session is registered
    Joined { chat_oid: Uuid, user_oid: Uuid },

    /// Text relayed from another session in the chat
    Message {
        chat_oid: Uuid,
        sender_oid: Uuid,
        text: String,
    },

    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Serialize into a text frame
    pub fn to_frame(&self) -> Frame {
        Frame::Text(self.to_json())
    }
}

/// Frame queued for a session's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Frame received from a client, decoded from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Text(String),
    Binary,
    Close,
    /// Transport failure; ends the session
    Error(String),
}
