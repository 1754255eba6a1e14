//! Value Objects
//!
//! Validated primitives. Construction is the only place validation happens;
//! a value object that exists is valid.

mod chats;
mod users;

pub use chats::{Text, Title, MAX_TITLE_LENGTH};
pub use users::{Password, Phone, Username, MIN_PASSWORD_LENGTH};
