use crate::db;
use crate::error::{AppError, ChatError, Result};
use crate::models::{Message, StoredMessage};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const STORED_MESSAGE_COLUMNS: &str = r#"
    m.id, m.club_id, m.sender_id, m.text, m.image_url, m.created_at,
    u.first_name || ' ' || u.last_name AS sender_name,
    u.avatar_url AS sender_avatar_url
"#;

/// Append-only chat log per club.
///
/// `append` keeps `created_at` non-decreasing within a club as long as
/// appends to that club are not concurrent; the chat gateway serializes them.
#[derive(Clone)]
pub struct MessageService {
    db: SqlitePool,
}

impl MessageService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn append(
        &self,
        club_id: Option<Uuid>,
        sender_id: Option<Uuid>,
        text: Option<&str>,
    ) -> Result<StoredMessage> {
        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(ChatError::EmptyText.into()),
        };
        let club_id = club_id.ok_or(ChatError::MissingClub)?;
        let sender_id = sender_id.ok_or(ChatError::MissingSender)?;

        let now = db::now();
        let created_at = match self.latest_created_at(club_id).await? {
            Some(latest) if latest > now => latest,
            _ => now,
        };

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO messages (id, club_id, sender_id, text, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(club_id)
        .bind(sender_id)
        .bind(text)
        .bind(db::timestamp(&created_at))
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Club or sender not found".to_string())
            }
            other => AppError::Database(other),
        })?;

        self.get_stored(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Message {} vanished after insert", id)))
    }

    async fn latest_created_at(&self, club_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let latest = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT created_at FROM messages
            WHERE club_id = ?
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(club_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(latest)
    }

    async fn get_stored(&self, id: Uuid) -> Result<Option<StoredMessage>> {
        let message = sqlx::query_as::<_, StoredMessage>(&format!(
            r#"
            SELECT {STORED_MESSAGE_COLUMNS}
            FROM messages m
            INNER JOIN users u ON u.id = m.sender_id
            WHERE m.id = ?
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(message)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, club_id, sender_id, text, image_url, created_at
            FROM messages WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(message)
    }

    /// Whole history of a club, oldest first
    // TODO: page with a `before` cursor once clubs outgrow a single fetch
    pub async fn list_by_club(&self, club_id: Uuid) -> Result<Vec<StoredMessage>> {
        let messages = sqlx::query_as::<_, StoredMessage>(&format!(
            r#"
            SELECT {STORED_MESSAGE_COLUMNS}
            FROM messages m
            INNER JOIN users u ON u.id = m.sender_id
            WHERE m.club_id = ?
            ORDER BY m.created_at ASC, m.seq ASC
            "#
        ))
        .bind(club_id)
        .fetch_all(&self.db)
        .await?;

        Ok(messages)
    }

    /// Hard delete. No authorization here; the gateway decides who may delete.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
