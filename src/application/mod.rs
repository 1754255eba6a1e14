//! Application Layer
//!
//! The command mediator, command handlers and the services they depend on.
//! Transports talk to the core only through `Mediator::dispatch`.

pub mod commands;
pub mod container;
pub mod dto;
pub mod errors;
pub mod mediator;
pub mod services;

pub use errors::CommandError;
pub use mediator::{Command, CommandHandler, Mediator};
