//! User API Tests

use axum::http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::{TestApp, PASSWORD};

const PHONE: &str = "+79010000000";

#[derive(Debug, serde::Deserialize)]
struct Subject {
    sub: Uuid,
}

fn decoded_subject(token: &str) -> Uuid {
    let public = include_bytes!("../fixtures/jwt-public.pem");
    let key = DecodingKey::from_rsa_pem(public).unwrap();
    decode::<Subject>(token, &key, &Validation::new(Algorithm::RS256))
        .unwrap()
        .claims
        .sub
}

#[tokio::test]
async fn test_sign_up_confirm_sign_in() {
    let app = TestApp::new().await;

    let user = app.sign_up("alice", PHONE).await;
    assert_eq!(user["username"], "alice");
    assert_eq!(user["phone"], PHONE);
    assert_eq!(user["is_confirmed"], false);
    let user_oid: Uuid = user["oid"].as_str().unwrap().parse().unwrap();

    let code = app.codes.code_for(PHONE).unwrap();
    assert_eq!(code.len(), 6);

    let confirmed = app
        .server
        .post("/api/v1/users/confirm")
        .json(&json!({"phone": PHONE, "code": code}))
        .await;
    confirmed.assert_status_ok();
    let token = confirmed.json::<Value>();
    assert_eq!(token["token_type"], "Bearer");

    let signed_in = app.sign_in(PHONE).await;
    assert_eq!(decoded_subject(&signed_in), user_oid);
}

#[tokio::test]
async fn test_sign_up_duplicate_phone_conflicts() {
    let app = TestApp::new().await;
    app.sign_up("alice", PHONE).await;

    let response = app
        .server
        .post("/api/v1/users/sign-up")
        .json(&json!({"username": "alice2", "phone": PHONE, "password": PASSWORD}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sign_up_rejects_malformed_phone() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/users/sign-up")
        .json(&json!({"username": "alice", "phone": "89010000000", "password": PASSWORD}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_up_rejects_malformed_json() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/users/sign-up")
        .json(&json!({"username": "alice"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_with_wrong_code_is_unauthorized() {
    let app = TestApp::new().await;
    app.sign_up("alice", PHONE).await;
    let code = app.codes.code_for(PHONE).unwrap();
    let wrong = if code == "123456" { "654321" } else { "123456" };

    let response = app
        .server
        .post("/api/v1/users/confirm")
        .json(&json!({"phone": PHONE, "code": wrong}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_before_confirmation_is_unauthorized() {
    let app = TestApp::new().await;
    app.sign_up("alice", PHONE).await;

    let response = app
        .server
        .post("/api/v1/users/sign-in")
        .json(&json!({"phone": PHONE, "password": PASSWORD}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("alice", PHONE).await;

    let response = app
        .server
        .post("/api/v1/users/sign-in")
        .json(&json!({"phone": PHONE, "password": "not-the-password"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_requires_token() {
    let app = TestApp::new().await;

    app.server
        .get("/api/v1/users")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/v1/users")
        .authorization_bearer("garbage")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_respects_limit() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice", "+79010000000").await;
    app.sign_up("bob", "+79010000001").await;
    app.sign_up("carol", "+79010000002").await;

    let all = app
        .server
        .get("/api/v1/users")
        .authorization_bearer(&token)
        .await;
    all.assert_status_ok();
    assert_eq!(all.json::<Vec<Value>>().len(), 3);

    let limited = app
        .server
        .get("/api/v1/users")
        .add_query_param("limit", 2)
        .authorization_bearer(&token)
        .await;
    limited.assert_status_ok();
    let names: Vec<String> = limited
        .json::<Vec<Value>>()
        .iter()
        .map(|user| user["username"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
}
