//! # Domain Layer
//!
//! Core business types of the chat backend, independent of transport and
//! storage.
//!
//! ## Structure
//!
//! - **entities**: User, Chat, Message and their repository traits
//! - **value_objects**: validated primitives (Username, Phone, Password, Text, Title)
//! - **errors**: validation failures raised when building value objects

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::ValidationError;
pub use value_objects::*;
