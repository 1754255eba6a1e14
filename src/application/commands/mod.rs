//! Commands and Handlers
//!
//! Each command is a plain value type; each handler is bound to its
//! collaborators at construction and holds no per-call state.
//!
//! Commands carry raw input. Handlers promote it to value objects first, so
//! validation failures surface before any side effect.
//!
//! - **users**: SignUp, ConfirmCode, SignIn, GetUsers
//! - **permissions**: AccessCheckUser, AccessCheckModerator
//! - **chats**: CreateChat, GetChat, CreateMessage, AddUserToChat,
//!   GetUserChats, GetUserChatMessages
//! - **moderators**: DeleteUser

pub mod chats;
pub mod moderators;
pub mod permissions;
pub mod users;

pub use chats::{
    AddUserToChat, AddUserToChatHandler, CreateChat, CreateChatHandler, CreateMessage,
    CreateMessageHandler, GetChat, GetChatHandler, GetUserChatMessages,
    GetUserChatMessagesHandler, GetUserChats, GetUserChatsHandler,
};
pub use moderators::{DeleteUser, DeleteUserHandler};
pub use permissions::{
    AccessCheckModerator, AccessCheckModeratorHandler, AccessCheckUser, AccessCheckUserHandler,
};
pub use users::{
    ConfirmCode, ConfirmCodeHandler, GetUsers, GetUsersHandler, SignIn, SignInHandler, SignUp,
    SignUpHandler,
};
