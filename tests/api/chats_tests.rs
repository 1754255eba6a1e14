//! Chat API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::{oid, TestApp};

#[tokio::test]
async fn test_create_chat_and_exchange_messages() {
    let app = TestApp::new().await;
    let (alice, token) = app.register("alice", "+79010000000").await;

    let chat = app.create_chat(&token, "t1").await;
    assert_eq!(chat["title"], "t1");
    assert_eq!(chat["members"], json!([alice]));
    let chat_oid = oid(&chat);

    let sent = app
        .server
        .post(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&token)
        .json(&json!({"text": "hi"}))
        .await;
    sent.assert_status(StatusCode::CREATED);
    let message = sent.json::<Value>();
    assert_eq!(message["sender_oid"], json!(alice));
    assert_eq!(message["chat_oid"], json!(chat_oid));

    let listed = app
        .server
        .get(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&token)
        .await;
    listed.assert_status_ok();
    let messages = listed.json::<Vec<Value>>();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["oid"], message["oid"]);
    assert_eq!(messages[0]["text"], "hi");
}

#[tokio::test]
async fn test_create_chat_rejects_invalid_titles() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice", "+79010000000").await;

    for title in [String::new(), "x".repeat(65)] {
        app.server
            .post("/api/v1/chats")
            .authorization_bearer(&token)
            .json(&json!({"title": title}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let chats = app
        .server
        .get("/api/v1/chats")
        .authorization_bearer(&token)
        .await
        .json::<Vec<Value>>();
    assert!(chats.is_empty());
}

#[tokio::test]
async fn test_list_chats_only_shows_memberships() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (_, bob) = app.register("bob", "+79010000001").await;
    app.create_chat(&alice, "alice-only").await;
    app.create_chat(&bob, "bob-only").await;

    let chats = app
        .server
        .get("/api/v1/chats")
        .authorization_bearer(&alice)
        .await
        .json::<Vec<Value>>();

    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["title"], "alice-only");
}

#[tokio::test]
async fn test_non_member_cannot_read_or_post() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (_, mallory) = app.register("mallory", "+79010000001").await;
    let chat_oid = oid(&app.create_chat(&alice, "private").await);

    app.server
        .get(&format!("/api/v1/chats/{chat_oid}"))
        .authorization_bearer(&mallory)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&mallory)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/messages"))
        .authorization_bearer(&mallory)
        .json(&json!({"text": "let me in"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_chat_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice", "+79010000000").await;

    app.server
        .get(&format!("/api/v1/chats/{}", Uuid::new_v4()))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_member_grants_access() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (bob_oid, bob) = app.register("bob", "+79010000001").await;
    let chat_oid = oid(&app.create_chat(&alice, "team").await);

    let added = app
        .server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&json!({"user_oid": bob_oid}))
        .await;
    added.assert_status_ok();
    assert_eq!(added.json::<Value>()["members"].as_array().unwrap().len(), 2);

    // adding again is a no-op
    let again = app
        .server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&json!({"user_oid": bob_oid}))
        .await;
    again.assert_status_ok();
    assert_eq!(again.json::<Value>()["members"].as_array().unwrap().len(), 2);

    app.server
        .get(&format!("/api/v1/chats/{chat_oid}"))
        .authorization_bearer(&bob)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_add_member_enforces_limit() {
    let app = TestApp::with_settings(|settings| settings.chat.max_members = 2).await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (bob, _) = app.register("bob", "+79010000001").await;
    let (carol, _) = app.register("carol", "+79010000002").await;
    let chat_oid = oid(&app.create_chat(&alice, "pair").await);

    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&json!({"user_oid": bob}))
        .await
        .assert_status_ok();

    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&json!({"user_oid": carol}))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let chat_oid = oid(&app.create_chat(&alice, "team").await);

    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&json!({"user_oid": Uuid::new_v4()}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
