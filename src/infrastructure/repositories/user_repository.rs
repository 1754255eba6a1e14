//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Credentials, Phone, User, UserRepository, Username};
use crate::shared::error::StorageError;

/// Database row representation of the users table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    oid: Uuid,
    username: String,
    phone: String,
    password_hash: String,
    is_confirmed: bool,
    is_blocked: bool,
    is_moderator: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert database row to domain User entity.
    fn try_into_user(self) -> Result<User, StorageError> {
        let corrupt = |e| StorageError::Internal(format!("corrupt user row {}: {}", self.oid, e));

        Ok(User {
            oid: self.oid,
            username: Username::new(self.username.clone()).map_err(corrupt)?,
            credentials: Credentials {
                phone: Phone::new(self.phone.clone()).map_err(corrupt)?,
                password_hash: self.password_hash,
            },
            is_confirmed: self.is_confirmed,
            is_blocked: self.is_blocked,
            is_moderator: self.is_moderator,
            created_at: self.created_at,
        })
    }
}

const SELECT_USER: &str = r#"
    SELECT oid, username, phone, password_hash, is_confirmed, is_blocked,
           is_moderator, created_at
    FROM users
"#;

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn add(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO users (oid, username, phone, password_hash, is_confirmed,
                               is_blocked, is_moderator, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.oid)
        .bind(user.username.as_str())
        .bind(user.phone().as_str())
        .bind(&user.credentials.password_hash)
        .bind(user.is_confirmed)
        .bind(user.is_blocked)
        .bind(user.is_moderator)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StorageError::Conflict(format!("phone {} already registered", user.phone()))
            }
            _ => StorageError::Database(e),
        })?;

        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE oid = $1"))
            .bind(oid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn get_by_phone(&self, phone: &Phone) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE phone = $1"))
            .bind(phone.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn list(&self, limit: usize) -> Result<Vec<User>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY created_at ASC, oid ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::try_into_user).collect()
    }

    async fn mark_confirmed(&self, oid: Uuid) -> Result<(), StorageError> {
        sqlx::query("UPDATE users SET is_confirmed = TRUE WHERE oid = $1")
            .bind(oid)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete(&self, oid: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE users SET is_blocked = TRUE WHERE oid = $1")
            .bind(oid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
