//! Chat Session Tests
//!
//! Drive the session state machine through in-process channels against the
//! same state the HTTP router uses.

use futures::channel::mpsc as client;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use chat_backend::presentation::websocket::{
    close_code, ChatSession, ClientFrame, Frame, SessionOutcome,
};

use crate::common::{oid, TestApp};

fn session(app: &TestApp, chat_oid: Uuid) -> (ChatSession, mpsc::UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(
        chat_oid,
        app.state.mediator.clone(),
        app.state.registry.clone(),
        tx,
    );
    (session, rx)
}

fn event(frame: Option<Frame>) -> Value {
    match frame {
        Some(Frame::Text(text)) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_stream_never_joins() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice", "+79010000000").await;
    let chat_oid = oid(&app.create_chat(&token, "t1").await);
    let (session, mut rx) = session(&app, chat_oid);
    let (_client, inbound) = client::unbounded::<ClientFrame>();

    let outcome = session.run(None, inbound).await;

    assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
    assert!(matches!(
        rx.recv().await,
        Some(Frame::Close { code: close_code::POLICY_VIOLATION, .. })
    ));
    assert_eq!(app.state.registry.session_count(chat_oid), 0);
    assert_eq!(app.state.registry.broadcast(chat_oid, "anyone?", None), 0);
}

#[tokio::test]
async fn test_stream_relays_and_persists() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.register("alice", "+79010000000").await;
    let (bob, bob_token) = app.register("bob", "+79010000001").await;
    let chat_oid = oid(&app.create_chat(&alice_token, "t1").await);
    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice_token)
        .json(&json!({"user_oid": bob}))
        .await
        .assert_status_ok();

    let (bob_session, mut bob_rx) = session(&app, chat_oid);
    let (bob_client, bob_inbound) = client::unbounded::<ClientFrame>();
    let bob_auth = format!("Bearer {bob_token}");
    let bob_task =
        tokio::spawn(async move { bob_session.run(Some(&bob_auth), bob_inbound).await });
    assert_eq!(
        event(bob_rx.recv().await),
        json!({"type": "joined", "payload": {"chat_oid": chat_oid, "user_oid": bob}})
    );

    let (alice_session, _alice_rx) = session(&app, chat_oid);
    let (alice_client, alice_inbound) = client::unbounded::<ClientFrame>();
    alice_client
        .unbounded_send(ClientFrame::Text("hello bob".into()))
        .unwrap();
    drop(alice_client);
    let outcome = alice_session
        .run(Some(&format!("Bearer {alice_token}")), alice_inbound)
        .await;
    assert_eq!(outcome, SessionOutcome::Finished(None));

    assert_eq!(
        event(bob_rx.recv().await),
        json!({
            "type": "message",
            "payload": {"chat_oid": chat_oid, "sender_oid": alice, "text": "hello bob"}
        })
    );

    // the relayed message is also readable over HTTP
    let messages = app
        .server
        .get(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&bob_token)
        .await
        .json::<Vec<Value>>();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hello bob");
    assert_eq!(messages[0]["sender_oid"], json!(alice));

    // a message posted over HTTP reaches the live session too
    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&alice_token)
        .json(&json!({"text": "via http"}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    assert_eq!(event(bob_rx.recv().await)["payload"]["text"], "via http");

    bob_client.unbounded_send(ClientFrame::Close).unwrap();
    assert_eq!(bob_task.await.unwrap(), SessionOutcome::Finished(None));
    assert_eq!(app.state.registry.session_count(chat_oid), 0);
}

#[tokio::test]
async fn test_blocked_user_cannot_open_stream() {
    let app = TestApp::new().await;
    let (_, moderator) = app.moderator("+79010000009").await;
    let (alice, token) = app.register("alice", "+79010000000").await;
    let chat_oid = oid(&app.create_chat(&token, "t1").await);
    app.server
        .delete(&format!("/api/v1/moderator/users/{alice}"))
        .authorization_bearer(&moderator)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let (session, _rx) = session(&app, chat_oid);
    let (_client, inbound) = client::unbounded::<ClientFrame>();
    let outcome = session.run(Some(&format!("Bearer {token}")), inbound).await;

    assert_eq!(outcome, SessionOutcome::Rejected(close_code::POLICY_VIOLATION));
    assert_eq!(app.state.registry.session_count(chat_oid), 0);
}
