//! Authentication Service
//!
//! Password hashing, the confirmation-code lifecycle and JWT issuance.
//!
//! Tokens are signed asymmetrically: the private key signs, the public key
//! verifies, so a process holding only the public key can still run the
//! permission pipeline.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::domain::{Password, Phone, User};
use crate::shared::error::StorageError;

/// Lowest and highest confirmation code, inclusive.
pub const CONFIRMATION_CODE_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

/// Ephemeral phone -> code storage with expiry.
///
/// Implemented in the infrastructure layer (in-memory, Redis).
#[async_trait]
pub trait ConfirmationCodeCache: Send + Sync {
    async fn set_with_ttl(&self, phone: &Phone, code: &str, ttl: Duration) -> Result<(), StorageError>;

    /// The stored code, or `None` when it was never set or has expired.
    async fn get(&self, phone: &Phone) -> Result<Option<String>, StorageError>;

    async fn delete(&self, phone: &Phone) -> Result<(), StorageError>;
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user oid)
    pub sub: Uuid,
    pub username: String,
    pub phone: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key material: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Token generation failed: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Signing and verification keys for one algorithm.
#[derive(Clone)]
pub struct JwtKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Build keys from PEM-encoded private and public halves.
    ///
    /// Symmetric (HS*) algorithms are rejected.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8], algorithm: Algorithm) -> Result<Self, AuthError> {
        let (encoding, decoding) = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => (
                EncodingKey::from_rsa_pem(private_pem).map_err(AuthError::InvalidKey)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(AuthError::InvalidKey)?,
            ),
            Algorithm::ES256 | Algorithm::ES384 => (
                EncodingKey::from_ec_pem(private_pem).map_err(AuthError::InvalidKey)?,
                DecodingKey::from_ec_pem(public_pem).map_err(AuthError::InvalidKey)?,
            ),
            Algorithm::EdDSA => (
                EncodingKey::from_ed_pem(private_pem).map_err(AuthError::InvalidKey)?,
                DecodingKey::from_ed_pem(public_pem).map_err(AuthError::InvalidKey)?,
            ),
            other => return Err(AuthError::UnsupportedAlgorithm(format!("{other:?}"))),
        };

        Ok(Self {
            algorithm,
            encoding,
            decoding,
        })
    }

    /// Read the key files named in settings. Fails fast on a missing file.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&settings.algorithm)
            .map_err(|_| AuthError::UnsupportedAlgorithm(settings.algorithm.clone()))?;
        let private_pem = read_key(&settings.private_key_path)?;
        let public_pem = read_key(&settings.public_key_path)?;

        Self::from_pem(&private_pem, &public_pem, algorithm)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

fn read_key(path: &str) -> Result<Vec<u8>, AuthError> {
    std::fs::read(path).map_err(|source| AuthError::KeyFile {
        path: path.to_string(),
        source,
    })
}

/// All cryptographic and credential-lifecycle operations.
pub struct AuthService {
    keys: JwtKeys,
    token_expiry_minutes: i64,
    code_ttl: Duration,
    code_cache: Arc<dyn ConfirmationCodeCache>,
}

impl AuthService {
    pub fn new(
        keys: JwtKeys,
        token_expiry_minutes: i64,
        code_ttl: Duration,
        code_cache: Arc<dyn ConfirmationCodeCache>,
    ) -> Self {
        Self {
            keys,
            token_expiry_minutes,
            code_ttl,
            code_cache,
        }
    }

    /// Hash a password using Argon2id with a fresh salt.
    ///
    /// Runs on the blocking pool.
    pub async fn hash_password(&self, password: &Password) -> Result<String, AuthError> {
        let plaintext = password.expose().to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    /// Verify a password against its hash
    pub async fn verify_password(&self, plaintext: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let plaintext = plaintext.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored_hash)
                .map_err(|e| AuthError::Hashing(format!("Invalid password hash: {e}")))?;

            Ok(Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    /// Six-digit numeric code, uniform over [`CONFIRMATION_CODE_RANGE`].
    pub fn generate_confirmation_code(&self) -> String {
        rand::rng().random_range(CONFIRMATION_CODE_RANGE).to_string()
    }

    pub async fn save_confirmation_code(&self, phone: &Phone, code: &str) -> Result<(), AuthError> {
        self.code_cache.set_with_ttl(phone, code, self.code_ttl).await?;
        Ok(())
    }

    /// Compare against the stored code. Never consumes it.
    pub async fn check_confirmation_code(&self, phone: &Phone, code: &str) -> Result<bool, AuthError> {
        let stored = self.code_cache.get(phone).await?;
        Ok(stored.as_deref() == Some(code))
    }

    pub async fn delete_confirmation_code(&self, phone: &Phone) -> Result<(), AuthError> {
        self.code_cache.delete(phone).await?;
        Ok(())
    }

    /// Sign a token for the user, expiring after the configured number of minutes.
    pub fn issue_token(&self, user: &User) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expiry = now + chrono::Duration::minutes(self.token_expiry_minutes);

        let claims = Claims {
            sub: user.oid,
            username: user.username.to_string(),
            phone: user.phone().to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        let access_token = encode(&Header::new(self.keys.algorithm), &claims, &self.keys.encoding)
            .map_err(AuthError::TokenEncoding)?;

        Ok(AccessToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry_minutes * 60,
        })
    }

    /// Decoded claims, or `None` on any signature, format or expiry failure.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.keys.algorithm);
        // no grace period past `exp`
        validation.leeway = 0;

        match decode::<Claims>(token, &self.keys.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                None
            }
        }
    }
}
