//! WebSocket Session State Machine
//!
//! One `ChatSession` drives one connection:
//!
//! `Connecting` → `Authenticating` → `ResolvingChat` → `Joined` →
//! `Streaming` → `Closed`
//!
//! Any failure before `Joined` closes the socket without touching the
//! registry. Once joined, the session stays registered until the stream
//! ends, and is deregistered even if the session future is dropped.
//!
//! The sender is re-authorized before every relayed message, so a block or
//! a membership purge closes open sockets on their next frame.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::messages::{close_code, ClientFrame, Frame, ServerEvent};
use super::registry::{ConnectionRegistry, SessionHandle, SessionId};
use crate::application::commands::{AccessCheckUser, CreateMessage, GetChat};
use crate::application::{CommandError, Mediator};
use crate::domain::{Text, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    ResolvingChat,
    Joined,
    Streaming,
    Closed,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Closed before joining, with this close code
    Rejected(u16),

    /// Joined, then closed. `None` when the client closed or went away.
    Finished(Option<u16>),
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn close_code_for(error: &CommandError) -> u16 {
    if error.is_domain() {
        close_code::POLICY_VIOLATION
    } else {
        close_code::INTERNAL_ERROR
    }
}

/// Deregisters on drop.
struct Registration {
    registry: Arc<ConnectionRegistry>,
    session_id: SessionId,
    chat_oid: Uuid,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove_connection(self.session_id, self.chat_oid);
    }
}

pub struct ChatSession {
    chat_oid: Uuid,
    mediator: Arc<Mediator>,
    registry: Arc<ConnectionRegistry>,
    outbound: mpsc::UnboundedSender<Frame>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(
        chat_oid: Uuid,
        mediator: Arc<Mediator>,
        registry: Arc<ConnectionRegistry>,
        outbound: mpsc::UnboundedSender<Frame>,
    ) -> Self {
        Self {
            chat_oid,
            mediator,
            registry,
            outbound,
            state: SessionState::Connecting,
        }
    }

    /// Run the session to completion.
    ///
    /// `authorization` is the raw `Authorization` header value; `inbound`
    /// yields the client's frames until it disconnects.
    pub async fn run<S>(mut self, authorization: Option<&str>, inbound: S) -> SessionOutcome
    where
        S: Stream<Item = ClientFrame> + Send,
    {
        let Some(token) = authorization.and_then(parse_bearer) else {
            return self.reject(close_code::POLICY_VIOLATION, "Missing or malformed bearer token");
        };

        self.transition(SessionState::Authenticating);
        let user = match self
            .mediator
            .dispatch_one(AccessCheckUser {
                token: token.to_owned(),
            })
            .await
        {
            Ok(user) => user,
            Err(error) => {
                debug!(chat_oid = %self.chat_oid, error = %error, "Session authentication failed");
                return self.reject(close_code_for(&error), "Authentication failed");
            }
        };

        self.transition(SessionState::ResolvingChat);
        let chat = match self
            .mediator
            .dispatch_one(GetChat {
                chat_oid: self.chat_oid,
                user: user.clone(),
            })
            .await
        {
            Ok(chat) => chat,
            Err(error) => {
                self.send(ServerEvent::error(error.to_string()).to_frame());
                return self.reject(close_code_for(&error), "Chat unavailable");
            }
        };

        let handle = SessionHandle::new(user.oid, self.outbound.clone());
        let registration = Registration {
            registry: self.registry.clone(),
            session_id: handle.id,
            chat_oid: chat.oid,
        };
        self.registry.accept_connection(handle, chat.oid);
        self.transition(SessionState::Joined);
        self.send(
            ServerEvent::Joined {
                chat_oid: chat.oid,
                user_oid: user.oid,
            }
            .to_frame(),
        );

        self.transition(SessionState::Streaming);
        let close = self.stream(token, registration.session_id, inbound).await;

        drop(registration);
        self.transition(SessionState::Closed);
        if let Some(code) = close {
            self.send(Frame::Close {
                code,
                reason: String::new(),
            });
        }

        info!(chat_oid = %self.chat_oid, user_oid = %user.oid, close_code = ?close, "Session finished");
        SessionOutcome::Finished(close)
    }

    /// Receive loop. Returns the close code to send, if any.
    async fn stream<S>(&self, token: &str, session_id: SessionId, inbound: S) -> Option<u16>
    where
        S: Stream<Item = ClientFrame> + Send,
    {
        let mut inbound = std::pin::pin!(inbound);

        while let Some(frame) = inbound.next().await {
            match frame {
                ClientFrame::Text(text) => {
                    if let Some(code) = self.relay(token, session_id, text).await {
                        return Some(code);
                    }
                }
                ClientFrame::Binary => {
                    self.send(ServerEvent::error("Binary frames are not supported").to_frame());
                    return Some(close_code::UNSUPPORTED_DATA);
                }
                ClientFrame::Close => return None,
                ClientFrame::Error(error) => {
                    warn!(session_id = %session_id, error = %error, "WebSocket receive failed");
                    return None;
                }
            }
        }

        None
    }

    /// Resolve the sender again and confirm it is still a member of the chat.
    async fn reauthorize(&self, token: &str) -> Result<User, CommandError> {
        let user = self
            .mediator
            .dispatch_one(AccessCheckUser {
                token: token.to_owned(),
            })
            .await?;
        self.mediator
            .dispatch_one(GetChat {
                chat_oid: self.chat_oid,
                user: user.clone(),
            })
            .await?;
        Ok(user)
    }

    /// Broadcast one text frame to the other sessions, then persist it.
    /// Returns a close code when the sender lost access.
    async fn relay(&self, token: &str, session_id: SessionId, text: String) -> Option<u16> {
        if let Err(error) = Text::new(text.as_str()) {
            self.send(ServerEvent::error(error.to_string()).to_frame());
            return None;
        }

        let user = match self.reauthorize(token).await {
            Ok(user) => user,
            Err(error) => {
                debug!(chat_oid = %self.chat_oid, error = %error, "Sender lost access");
                self.send(ServerEvent::error(error.to_string()).to_frame());
                return Some(close_code_for(&error));
            }
        };

        let payload = ServerEvent::Message {
            chat_oid: self.chat_oid,
            sender_oid: user.oid,
            text: text.clone(),
        }
        .to_json();
        let delivered = self.registry.broadcast(self.chat_oid, &payload, Some(session_id));
        debug!(chat_oid = %self.chat_oid, delivered, "Message relayed");

        let result = self
            .mediator
            .dispatch_one(CreateMessage {
                text,
                chat_oid: self.chat_oid,
                user: user.clone(),
            })
            .await;

        if let Err(error) = result {
            warn!(chat_oid = %self.chat_oid, user_oid = %user.oid, error = %error, "Failed to store message");
            self.send(ServerEvent::error(error.to_string()).to_frame());
        }
        None
    }

    fn reject(&mut self, code: u16, reason: &str) -> SessionOutcome {
        self.send(Frame::Close {
            code,
            reason: reason.to_owned(),
        });
        self.transition(SessionState::Closed);
        SessionOutcome::Rejected(code)
    }

    fn send(&self, frame: Frame) {
        if self.outbound.send(frame).is_err() {
            debug!(chat_oid = %self.chat_oid, "Writer gone, dropping frame");
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(chat_oid = %self.chat_oid, from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixtures::Fixture;
    use crate::application::container::{build_mediator, Dependencies, HandlerOptions};
    use crate::domain::{Chat, Title};
    use crate::infrastructure::sender::LogCodeSender;
    use futures::channel::mpsc as client;
    use serde_json::json;
    use test_case::test_case;

    struct Harness {
        fx: Fixture,
        mediator: Arc<Mediator>,
        registry: Arc<ConnectionRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            let fx = Fixture::new();
            let deps = Dependencies {
                users: fx.users.clone(),
                chats: fx.chats.clone(),
                messages: fx.messages.clone(),
                auth: fx.auth.clone(),
                code_sender: Arc::new(LogCodeSender),
            };
            let mediator = build_mediator(&deps, HandlerOptions::default()).unwrap();
            Self {
                fx,
                mediator: Arc::new(mediator),
                registry: Arc::new(ConnectionRegistry::new()),
            }
        }

        async fn chat_with(&self, members: &[&User]) -> Chat {
            let mut chat = Chat::create(Title::new("t1").unwrap(), members[0]);
            for member in &members[1..] {
                chat.add_member(member.oid);
            }
            self.fx.chats.add(&chat).await.unwrap();
            chat
        }

        fn bearer(&self, user: &User) -> String {
            format!("Bearer {}", self.fx.auth.issue_token(user).unwrap().access_token)
        }

        fn session(&self, chat_oid: Uuid) -> (ChatSession, mpsc::UnboundedReceiver<Frame>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let session = ChatSession::new(chat_oid, self.mediator.clone(), self.registry.clone(), tx);
            (session, rx)
        }
    }

    fn event(frame: Frame) -> serde_json::Value {
        match frame {
            Frame::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[test_case("Bearer abc" => Some("abc"))]
    #[test_case("bearer   abc  " => Some("abc"))]
    #[test_case("Basic abc" => None)]
    #[test_case("Bearer" => None)]
    #[test_case("Bearer   " => None)]
    #[test_case("" => None)]
    fn test_parse_bearer(header: &str) -> Option<&str> {
        parse_bearer(header)
    }

    #[tokio::test]
    async fn test_missing_bearer_is_rejected_without_registration() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, mut rx) = h.session(chat.oid);
        let (_client, inbound) = client::unbounded::<ClientFrame>();

        let outcome = session.run(None, inbound).await;

        assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
        assert!(matches!(
            rx.recv().await,
            Some(Frame::Close { code: close_code::POLICY_VIOLATION, .. })
        ));
        assert_eq!(h.registry.session_count(chat.oid), 0);
        assert_eq!(h.registry.broadcast(chat.oid, "anyone?", None), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let h = Harness::new();
        let (session, _rx) = h.session(Uuid::new_v4());
        let (_client, inbound) = client::unbounded::<ClientFrame>();

        let outcome = session.run(Some("Bearer not-a-jwt"), inbound).await;

        assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
    }

    #[tokio::test]
    async fn test_unknown_chat_sends_error_then_closes() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let (session, mut rx) = h.session(Uuid::new_v4());
        let (_client, inbound) = client::unbounded::<ClientFrame>();

        let outcome = session.run(Some(&h.bearer(&alice)), inbound).await;

        assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
        assert_eq!(
            event(rx.recv().await.unwrap()),
            json!({"type": "error", "payload": {"message": "Chat not found"}})
        );
        assert!(matches!(rx.recv().await, Some(Frame::Close { .. })));
    }

    #[tokio::test]
    async fn test_non_member_is_rejected() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let mallory = h.fx.confirmed_user("mallory", "+79010000001").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, _rx) = h.session(chat.oid);
        let (_client, inbound) = client::unbounded::<ClientFrame>();

        let outcome = session.run(Some(&h.bearer(&mallory)), inbound).await;

        assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
        assert_eq!(h.registry.session_count(chat.oid), 0);
    }

    #[tokio::test]
    async fn test_text_is_relayed_to_others_and_persisted() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let bob = h.fx.confirmed_user("bob", "+79010000001").await;
        let chat = h.chat_with(&[&alice, &bob]).await;

        // bob joins first and stays connected
        let (bob_session, mut bob_rx) = h.session(chat.oid);
        let (bob_client, bob_inbound) = client::unbounded::<ClientFrame>();
        let bob_auth = h.bearer(&bob);
        let bob_task = tokio::spawn(async move { bob_session.run(Some(&bob_auth), bob_inbound).await });
        assert_eq!(event(bob_rx.recv().await.unwrap())["type"], "joined");

        // alice sends one message and leaves
        let (alice_session, mut alice_rx) = h.session(chat.oid);
        let (alice_client, alice_inbound) = client::unbounded::<ClientFrame>();
        alice_client.unbounded_send(ClientFrame::Text("hi".into())).unwrap();
        alice_client.unbounded_send(ClientFrame::Close).unwrap();
        let outcome = alice_session.run(Some(&h.bearer(&alice)), alice_inbound).await;

        assert_eq!(outcome, SessionOutcome::Finished(None));
        assert_eq!(event(alice_rx.recv().await.unwrap())["type"], "joined");
        assert!(alice_rx.try_recv().is_err(), "sender must not receive its own message");

        assert_eq!(
            event(bob_rx.recv().await.unwrap()),
            json!({
                "type": "message",
                "payload": {"chat_oid": chat.oid, "sender_oid": alice.oid, "text": "hi"}
            })
        );

        let stored = h.fx.messages.list_by_chat(chat.oid).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].sender_oid, alice.oid);
        assert_eq!(stored[0].text.as_str(), "hi");

        drop(bob_client);
        assert_eq!(bob_task.await.unwrap(), SessionOutcome::Finished(None));
        assert_eq!(h.registry.session_count(chat.oid), 0);
    }

    #[tokio::test]
    async fn test_blocked_sender_is_closed_on_next_frame() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let bob = h.fx.confirmed_user("bob", "+79010000001").await;
        let chat = h.chat_with(&[&alice, &bob]).await;

        let (bob_session, mut bob_rx) = h.session(chat.oid);
        let (bob_client, bob_inbound) = client::unbounded::<ClientFrame>();
        let bob_auth = h.bearer(&bob);
        let bob_task = tokio::spawn(async move { bob_session.run(Some(&bob_auth), bob_inbound).await });
        assert_eq!(event(bob_rx.recv().await.unwrap())["type"], "joined");

        let (alice_session, mut alice_rx) = h.session(chat.oid);
        let (alice_client, alice_inbound) = client::unbounded::<ClientFrame>();
        let alice_auth = h.bearer(&alice);
        let alice_task =
            tokio::spawn(async move { alice_session.run(Some(&alice_auth), alice_inbound).await });
        assert_eq!(event(alice_rx.recv().await.unwrap())["type"], "joined");
        assert_eq!(h.registry.session_count(chat.oid), 2);

        assert!(h.fx.users.soft_delete(alice.oid).await.unwrap());
        alice_client
            .unbounded_send(ClientFrame::Text("after block".into()))
            .unwrap();

        assert_eq!(
            alice_task.await.unwrap(),
            SessionOutcome::Finished(Some(close_code::POLICY_VIOLATION))
        );
        assert_eq!(event(alice_rx.recv().await.unwrap())["type"], "error");
        assert!(matches!(
            alice_rx.recv().await,
            Some(Frame::Close { code: close_code::POLICY_VIOLATION, .. })
        ));
        assert!(h.fx.messages.list_by_chat(chat.oid).await.unwrap().is_empty());
        assert!(bob_rx.try_recv().is_err(), "nothing is relayed after the block");
        assert_eq!(h.registry.session_count(chat.oid), 1);

        drop(bob_client);
        assert_eq!(bob_task.await.unwrap(), SessionOutcome::Finished(None));
    }

    #[tokio::test]
    async fn test_purged_member_is_closed_on_next_frame() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, mut rx) = h.session(chat.oid);
        let (client_tx, inbound) = client::unbounded::<ClientFrame>();
        let auth = h.bearer(&alice);
        let task = tokio::spawn(async move { session.run(Some(&auth), inbound).await });
        assert_eq!(event(rx.recv().await.unwrap())["type"], "joined");

        h.fx.chats.remove_member_from_all(alice.oid).await.unwrap();
        client_tx.unbounded_send(ClientFrame::Text("still here?".into())).unwrap();

        assert_eq!(
            task.await.unwrap(),
            SessionOutcome::Finished(Some(close_code::POLICY_VIOLATION))
        );
        assert!(h.fx.messages.list_by_chat(chat.oid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_reports_error_and_keeps_streaming() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, mut rx) = h.session(chat.oid);
        let (client_tx, inbound) = client::unbounded::<ClientFrame>();
        client_tx.unbounded_send(ClientFrame::Text(String::new())).unwrap();
        client_tx.unbounded_send(ClientFrame::Text("after".into())).unwrap();
        drop(client_tx);

        let outcome = session.run(Some(&h.bearer(&alice)), inbound).await;

        assert_eq!(outcome, SessionOutcome::Finished(None));
        assert_eq!(event(rx.recv().await.unwrap())["type"], "joined");
        assert_eq!(event(rx.recv().await.unwrap())["type"], "error");
        assert_eq!(h.fx.messages.list_by_chat(chat.oid).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_binary_frame_closes_with_unsupported_data() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, mut rx) = h.session(chat.oid);
        let (client_tx, inbound) = client::unbounded::<ClientFrame>();
        client_tx.unbounded_send(ClientFrame::Binary).unwrap();

        let outcome = session.run(Some(&h.bearer(&alice)), inbound).await;

        assert_eq!(outcome, SessionOutcome::Finished(Some(close_code::UNSUPPORTED_DATA)));
        assert_eq!(event(rx.recv().await.unwrap())["type"], "joined");
        assert_eq!(event(rx.recv().await.unwrap())["type"], "error");
        assert!(matches!(
            rx.recv().await,
            Some(Frame::Close { code: close_code::UNSUPPORTED_DATA, .. })
        ));
        assert_eq!(h.registry.session_count(chat.oid), 0);
    }

    #[tokio::test]
    async fn test_dropped_session_is_deregistered() {
        let h = Harness::new();
        let alice = h.fx.confirmed_user("alice", "+79010000000").await;
        let chat = h.chat_with(&[&alice]).await;
        let (session, mut rx) = h.session(chat.oid);
        let (_client, inbound) = client::unbounded::<ClientFrame>();
        let auth = h.bearer(&alice);

        let task = tokio::spawn(async move { session.run(Some(&auth), inbound).await });
        assert_eq!(event(rx.recv().await.unwrap())["type"], "joined");
        assert_eq!(h.registry.session_count(chat.oid), 1);

        task.abort();
        let _ = task.await;

        assert_eq!(h.registry.session_count(chat.oid), 0);
    }
}
