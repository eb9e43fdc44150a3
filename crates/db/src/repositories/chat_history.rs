use chrono::{DateTime, Utc};
use sqlx::Row;

use receiptly_core::domain::chat::ChatEntry;

use super::{ChatHistoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChatHistoryRepository {
    pool: DbPool,
}

impl SqlChatHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChatHistoryRepository for SqlChatHistoryRepository {
    async fn append(&self, entry: &ChatEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_entry (id, user_id, question, answer, session_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(&entry.session_id)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, question, answer, session_id, created_at
             FROM chat_entry WHERE user_id = ?
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let created_at_raw: String = row.try_get("created_at")?;
                let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
                    .map(|value| value.with_timezone(&Utc))
                    .map_err(|err| RepositoryError::Decode(format!("decode created_at: {err}")))?;

                Ok(ChatEntry {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    question: row.try_get("question")?,
                    answer: row.try_get("answer")?,
                    session_id: row.try_get("session_id")?,
                    created_at,
                })
            })
            .collect()
    }
}
