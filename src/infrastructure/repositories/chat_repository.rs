//! Chat Repository Implementation
//!
//! PostgreSQL implementation of the ChatRepository trait. Membership lives in
//! `chat_members`; members are aggregated back in join order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Chat, ChatRepository, MemberAddition, Title};
use crate::shared::error::StorageError;

#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    oid: Uuid,
    title: String,
    created_at: DateTime<Utc>,
    members: Vec<Uuid>,
}

impl ChatRow {
    fn try_into_chat(self) -> Result<Chat, StorageError> {
        let title = Title::new(self.title)
            .map_err(|e| StorageError::Internal(format!("corrupt chat row {}: {}", self.oid, e)))?;

        Ok(Chat::restore(self.oid, title, self.created_at, self.members))
    }
}

const SELECT_CHAT: &str = r#"
    SELECT c.oid, c.title, c.created_at,
           ARRAY(
               SELECT m.user_oid FROM chat_members m
               WHERE m.chat_oid = c.oid
               ORDER BY m.joined_at
           ) AS members
    FROM chats c
"#;

/// PostgreSQL chat repository implementation.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn add(&self, chat: &Chat) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO chats (oid, title, created_at) VALUES ($1, $2, $3)")
            .bind(chat.oid)
            .bind(chat.title.as_str())
            .bind(chat.created_at)
            .execute(&mut *tx)
            .await?;

        for member in chat.members() {
            sqlx::query("INSERT INTO chat_members (chat_oid, user_oid) VALUES ($1, $2)")
                .bind(chat.oid)
                .bind(member)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Chat>, StorageError> {
        let row = sqlx::query_as::<_, ChatRow>(&format!("{SELECT_CHAT} WHERE c.oid = $1"))
            .bind(oid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ChatRow::try_into_chat).transpose()
    }

    async fn list_by_member(&self, user_oid: Uuid) -> Result<Vec<Chat>, StorageError> {
        let rows = sqlx::query_as::<_, ChatRow>(&format!(
            r#"{SELECT_CHAT}
            WHERE EXISTS (
                SELECT 1 FROM chat_members m
                WHERE m.chat_oid = c.oid AND m.user_oid = $1
            )
            ORDER BY c.created_at"#
        ))
        .bind(user_oid)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatRow::try_into_chat).collect()
    }

    async fn add_member(
        &self,
        chat_oid: Uuid,
        user_oid: Uuid,
        limit: usize,
    ) -> Result<MemberAddition, StorageError> {
        let mut tx = self.pool.begin().await?;

        // the row lock serializes concurrent invites into the same chat
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT oid FROM chats WHERE oid = $1 FOR UPDATE")
            .bind(chat_oid)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(MemberAddition::ChatMissing);
        }

        let (is_member, count): (bool, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(bool_or(user_oid = $2), false), COUNT(*)
            FROM chat_members
            WHERE chat_oid = $1
            "#,
        )
        .bind(chat_oid)
        .bind(user_oid)
        .fetch_one(&mut *tx)
        .await?;

        if is_member {
            return Ok(MemberAddition::AlreadyMember);
        }
        if usize::try_from(count).unwrap_or(usize::MAX) >= limit {
            return Ok(MemberAddition::LimitReached);
        }

        sqlx::query("INSERT INTO chat_members (chat_oid, user_oid) VALUES ($1, $2)")
            .bind(chat_oid)
            .bind(user_oid)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(MemberAddition::Added)
    }

    async fn remove_member_from_all(&self, user_oid: Uuid) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM chat_members WHERE user_oid = $1")
            .bind(user_oid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete(&self, oid: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM chats WHERE oid = $1")
            .bind(oid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
