//! WebSocket Chat Streaming
//!
//! Real-time chat sessions: one state machine per connection, fanned out
//! through a shared connection registry.

pub mod handler;
pub mod messages;
pub mod registry;
pub mod session;

pub use handler::ws_handler;
pub use messages::{close_code, ClientFrame, Frame, ServerEvent};
pub use registry::{ConnectionRegistry, SessionHandle, SessionId};
pub use session::{parse_bearer, ChatSession, SessionOutcome, SessionState};
