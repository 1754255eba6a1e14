//! Domain validation errors.
//!
//! Raised only where a raw value is promoted to a value object.

/// Validation failure when constructing a value object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Phone must not be empty")]
    EmptyPhone,

    #[error("Phone should be in this format: +79000000000, got {0}")]
    InvalidPhoneFormat(String),

    #[error("Password should be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Message text must not be empty")]
    EmptyText,

    #[error("Chat title must not be empty")]
    EmptyTitle,

    #[error("Chat title is too long: {preview}...")]
    TitleTooLong { preview: String },
}
