//! Moderator API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::common::{oid, TestApp};

#[tokio::test]
async fn test_moderator_blocks_user() {
    let app = TestApp::new().await;
    let (_, moderator) = app.moderator("+79010000009").await;
    let (alice, alice_token) = app.register("alice", "+79010000000").await;

    app.server
        .delete(&format!("/api/v1/moderator/users/{alice}"))
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let stored = app.users.get_by_oid(alice).await.unwrap().unwrap();
    assert!(stored.is_blocked);

    // the blocked user's token no longer passes the permission check
    app.server
        .get("/api/v1/chats")
        .authorization_bearer(&alice_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_regular_user_cannot_block() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice", "+79010000000").await;
    let (_, bob) = app.register("bob", "+79010000001").await;

    app.server
        .delete(&format!("/api/v1/moderator/users/{alice}"))
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let stored = app.users.get_by_oid(alice).await.unwrap().unwrap();
    assert!(!stored.is_blocked);
}

#[tokio::test]
async fn test_blocking_unknown_user_is_a_no_op() {
    let app = TestApp::new().await;
    let (_, moderator) = app.moderator("+79010000009").await;

    app.server
        .delete(&format!("/api/v1/moderator/users/{}", Uuid::new_v4()))
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_memberships_retained_by_default() {
    let app = TestApp::new().await;
    let (_, moderator) = app.moderator("+79010000009").await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (bob, _) = app.register("bob", "+79010000001").await;
    let chat_oid = oid(&app.create_chat(&alice, "team").await);
    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&serde_json::json!({"user_oid": bob}))
        .await
        .assert_status_ok();

    app.server
        .delete(&format!("/api/v1/moderator/users/{bob}"))
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let chat = app
        .server
        .get(&format!("/api/v1/chats/{chat_oid}"))
        .authorization_bearer(&alice)
        .await
        .json::<serde_json::Value>();
    assert_eq!(chat["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_memberships_purged_when_configured() {
    let app = TestApp::with_settings(|settings| {
        settings.moderation.purge_memberships_on_block = true;
    })
    .await;
    let (_, moderator) = app.moderator("+79010000009").await;
    let (_, alice) = app.register("alice", "+79010000000").await;
    let (bob, _) = app.register("bob", "+79010000001").await;
    let chat_oid = oid(&app.create_chat(&alice, "team").await);
    app.server
        .post(&format!("/api/v1/chats/{chat_oid}/members"))
        .authorization_bearer(&alice)
        .json(&serde_json::json!({"user_oid": bob}))
        .await
        .assert_status_ok();

    app.server
        .delete(&format!("/api/v1/moderator/users/{bob}"))
        .authorization_bearer(&moderator)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let chat = app
        .server
        .get(&format!("/api/v1/chats/{chat_oid}"))
        .authorization_bearer(&alice)
        .await
        .json::<serde_json::Value>();
    assert_eq!(chat["members"].as_array().unwrap().len(), 1);
}
