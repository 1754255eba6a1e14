//! Common Test Utilities
//!
//! A test application over the in-memory backends, with a code sender that
//! records every confirmation code it is asked to deliver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use chat_backend::application::container::Dependencies;
use chat_backend::application::services::{AuthService, CodeSender, JwtKeys};
use chat_backend::config::Settings;
use chat_backend::domain::{Credentials, Password, Phone, User, UserRepository, Username};
use chat_backend::infrastructure::cache::MemoryCodeCache;
use chat_backend::infrastructure::memory::{
    MemoryChatRepository, MemoryMessageRepository, MemoryStore, MemoryUserRepository,
};
use chat_backend::shared::error::StorageError;
use chat_backend::startup::{build_router, state_from_dependencies, AppState};

pub const PASSWORD: &str = "alpine1212";

/// Code sender that keeps the last code per phone
#[derive(Default)]
pub struct RecordingCodeSender {
    codes: Mutex<HashMap<String, String>>,
}

impl RecordingCodeSender {
    pub fn code_for(&self, phone: &str) -> Option<String> {
        self.codes.lock().get(phone).cloned()
    }
}

#[async_trait]
impl CodeSender for RecordingCodeSender {
    async fn send_code(&self, user: &User, code: &str) -> Result<(), StorageError> {
        self.codes
            .lock()
            .insert(user.phone().to_string(), code.to_owned());
        Ok(())
    }
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Settings with fixture keys and in-memory backends
pub fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings are valid");
    settings.jwt.private_key_path = fixture("jwt-private.pem");
    settings.jwt.public_key_path = fixture("jwt-public.pem");
    settings
}

/// Test application builder
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<AuthService>,
    pub codes: Arc<RecordingCodeSender>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    pub async fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        configure(&mut settings);

        let keys = JwtKeys::from_settings(&settings.jwt).expect("fixture keys load");
        let auth = Arc::new(AuthService::new(
            keys,
            settings.jwt.access_token_expiry_minutes,
            Duration::from_secs(settings.cache.confirmation_code_ttl_secs),
            Arc::new(MemoryCodeCache::new()),
        ));

        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new(store.clone()));
        let codes = Arc::new(RecordingCodeSender::default());

        let deps = Dependencies {
            users: users.clone(),
            chats: Arc::new(MemoryChatRepository::new(store.clone())),
            messages: Arc::new(MemoryMessageRepository::new(store)),
            auth: auth.clone(),
            code_sender: codes.clone(),
        };
        let state = state_from_dependencies(settings, &deps).expect("mediator wires up");
        let server = TestServer::new(build_router(state.clone())).expect("test server starts");

        Self {
            server,
            state,
            users,
            auth,
            codes,
        }
    }

    /// Sign up; returns the created user's JSON
    pub async fn sign_up(&self, username: &str, phone: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/users/sign-up")
            .json(&json!({"username": username, "phone": phone, "password": PASSWORD}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    /// Sign up and confirm; returns the user oid and an access token
    pub async fn register(&self, username: &str, phone: &str) -> (Uuid, String) {
        let user = self.sign_up(username, phone).await;
        let code = self.codes.code_for(phone).expect("code was sent");

        let response = self
            .server
            .post("/api/v1/users/confirm")
            .json(&json!({"phone": phone, "code": code}))
            .await;
        response.assert_status_ok();

        let oid = user["oid"].as_str().unwrap().parse().unwrap();
        let token = response.json::<Value>()["access_token"]
            .as_str()
            .unwrap()
            .to_owned();
        (oid, token)
    }

    /// Persist a confirmed moderator directly and sign in over HTTP
    pub async fn moderator(&self, phone: &str) -> (Uuid, String) {
        let password_hash = self
            .auth
            .hash_password(&Password::new(PASSWORD).unwrap())
            .await
            .unwrap();
        let mut user = User::new(
            Username::new("moderator").unwrap(),
            Credentials {
                phone: Phone::new(phone).unwrap(),
                password_hash,
            },
        );
        user.confirm();
        user.is_moderator = true;
        self.users.add(&user).await.unwrap();

        (user.oid, self.sign_in(phone).await)
    }

    pub async fn sign_in(&self, phone: &str) -> String {
        let response = self
            .server
            .post("/api/v1/users/sign-in")
            .json(&json!({"phone": phone, "password": PASSWORD}))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["access_token"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    /// Create a chat; returns its JSON
    pub async fn create_chat(&self, token: &str, title: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/chats")
            .authorization_bearer(token)
            .json(&json!({"title": title}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }
}

pub fn oid(value: &Value) -> Uuid {
    value["oid"].as_str().unwrap().parse().unwrap()
}
