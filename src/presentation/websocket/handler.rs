//! WebSocket Connection Handler
//!
//! Bridges an axum socket to a `ChatSession`: a writer task drains the
//! session's outbound channel into the socket while the session consumes
//! the inbound half.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use futures::{future, SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{ClientFrame, Frame};
use super::session::ChatSession;
use crate::startup::AppState;

/// WebSocket upgrade handler for `/ws/chats/{chat_oid}`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(chat_oid): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    // Authentication happens after the upgrade so failures get a close code
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, chat_oid, authorization))
}

async fn handle_socket(socket: WebSocket, state: AppState, chat_oid: Uuid, authorization: Option<String>) {
    let (mut sink, stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let (message, closing) = match frame {
                Frame::Text(text) => (Message::Text(text.into()), false),
                Frame::Close { code, reason } => (
                    Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })),
                    true,
                ),
            };

            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let inbound = stream
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(ClientFrame::Text(text.as_str().to_owned())),
                Ok(Message::Binary(_)) => Some(ClientFrame::Binary),
                Ok(Message::Close(_)) => Some(ClientFrame::Close),
                // ping/pong are answered by the transport
                Ok(_) => None,
                Err(e) => Some(ClientFrame::Error(e.to_string())),
            })
        })
        .boxed();

    let session = ChatSession::new(chat_oid, state.mediator.clone(), state.registry.clone(), tx);
    let outcome = session.run(authorization.as_deref(), inbound).await;
    tracing::debug!(chat_oid = %chat_oid, outcome = ?outcome, "WebSocket connection finished");

    // Every sender is gone once the session is dropped; the writer drains and exits
    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "WebSocket writer task failed");
    }
}
