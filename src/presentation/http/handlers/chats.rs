//! Chat Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::commands::{
    AddUserToChat, CreateChat, CreateMessage, GetChat, GetUserChatMessages, GetUserChats,
};
use crate::application::dto::request::{AddMemberRequest, CreateChatRequest, CreateMessageRequest};
use crate::application::dto::response::{ChatResponse, MessageResponse};
use crate::presentation::http::extractors::{CurrentUser, ValidatedJson};
use crate::presentation::websocket::ServerEvent;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn create_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let chat = state
        .mediator
        .dispatch_one(CreateChat {
            title: body.title,
            user,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(chat.into())))
}

/// Chats the current user belongs to
pub async fn list_chats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ChatResponse>>, AppError> {
    let chats = state.mediator.dispatch_one(GetUserChats { user }).await?;

    Ok(Json(chats.into_iter().map(ChatResponse::from).collect()))
}

pub async fn get_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_oid): Path<Uuid>,
) -> Result<Json<ChatResponse>, AppError> {
    let chat = state.mediator.dispatch_one(GetChat { chat_oid, user }).await?;

    Ok(Json(chat.into()))
}

pub async fn get_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_oid): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = state
        .mediator
        .dispatch_one(GetUserChatMessages { user, chat_oid })
        .await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Store a message and relay it to the chat's live sessions
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_oid): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let message = state
        .mediator
        .dispatch_one(CreateMessage {
            text: body.text,
            chat_oid,
            user,
        })
        .await?;

    let payload = ServerEvent::Message {
        chat_oid: message.chat_oid,
        sender_oid: message.sender_oid,
        text: message.text.as_str().to_owned(),
    }
    .to_json();
    state.registry.broadcast(chat_oid, &payload, None);

    Ok((StatusCode::CREATED, Json(message.into())))
}

pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_oid): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let chat = state
        .mediator
        .dispatch_one(AddUserToChat {
            user_oid: body.user_oid,
            chat_oid,
            user,
        })
        .await?;

    Ok(Json(chat.into()))
}
