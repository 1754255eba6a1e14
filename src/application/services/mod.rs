//! Application Services
//!
//! - **AuthService**: password hashing, confirmation codes, JWT tokens
//! - **CodeSender**: outbound delivery of confirmation codes

pub mod auth_service;
pub mod code_sender;

pub use auth_service::{
    AccessToken, AuthError, AuthService, Claims, ConfirmationCodeCache, JwtKeys,
    CONFIRMATION_CODE_RANGE,
};
pub use code_sender::CodeSender;

#[cfg(test)]
pub use code_sender::MockCodeSender;
