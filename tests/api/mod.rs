//! API Tests

mod chats_tests;
mod health_tests;
mod moderator_tests;
mod session_tests;
mod users_tests;
