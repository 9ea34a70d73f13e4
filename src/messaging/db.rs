/**
 * Message Database Operations
 *
 * Message model and the database operations for message CRUD.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A chat message as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: Uuid,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Get a message by ID
pub async fn get_message_by_id(pool: &PgPool, id: i64) -> Result<Option<Message>, sqlx::Error> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, chat_id, sender_id, text, sent_at
        FROM messages
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// All messages of a chat, oldest first.
pub async fn get_messages_by_chat_id(
    pool: &PgPool,
    chat_id: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, chat_id, sender_id, text, sent_at
        FROM messages
        WHERE chat_id = $1
        ORDER BY sent_at, id
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Persist a new message.
pub async fn create_message(
    pool: &PgPool,
    chat_id: i64,
    sender_id: Uuid,
    text: &str,
) -> Result<Message, sqlx::Error> {
    let now = Utc::now();

    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (chat_id, sender_id, text, sent_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, chat_id, sender_id, text, sent_at
        "#,
    )
    .bind(chat_id)
    .bind(sender_id)
    .bind(text)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Delete a message. Returns `false` when the message did not exist.
pub async fn delete_message(pool: &PgPool, message_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
