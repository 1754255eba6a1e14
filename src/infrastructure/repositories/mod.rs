//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.
//!
//! - **PgUserRepository** - accounts and moderation flags
//! - **PgChatRepository** - chats and the `chat_members` relation
//! - **PgMessageRepository** - messages, removed together with their chat

pub mod chat_repository;
pub mod message_repository;
pub mod user_repository;

pub use chat_repository::PgChatRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
