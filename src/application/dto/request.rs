//! Request DTOs
//!
//! Data structures for API request bodies. These checks are shallow; the
//! value objects enforce the real rules inside the handlers.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(min = 10, message = "Password is too short"))]
    pub password: String,
}

/// Confirmation code request
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmCodeRequest {
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// Sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create chat request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(min = 1, max = 64, message = "Title must be 1-64 characters"))]
    pub title: String,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, message = "Message text must not be empty"))]
    pub text: String,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_oid: Uuid,
}

/// User listing query
#[derive(Debug, Deserialize, Validate)]
pub struct ListUsersQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}
