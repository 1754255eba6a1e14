//! # Domain Entities
//!
//! - **User**: account with owned credentials and moderation flags
//! - **Chat**: titled conversation with a member set
//! - **Message**: immutable text sent to a chat
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer.

mod chat;
mod message;
mod user;

pub use chat::{Chat, ChatRepository, MemberAddition};
pub use message::{Message, MessageRepository};
pub use user::{Credentials, User, UserRepository};
