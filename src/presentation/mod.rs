//! Presentation Layer
//!
//! HTTP routes and WebSocket chat sessions. Both adapt requests into
//! commands and never touch repositories directly.

pub mod http;
pub mod middleware;
pub mod websocket;
