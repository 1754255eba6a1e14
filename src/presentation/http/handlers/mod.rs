//! HTTP Handlers
//!
//! Thin adapters: extract, dispatch one command, map the result.

pub mod chats;
pub mod health;
pub mod moderator;
pub mod users;
