/**
 * Chat Database Operations
 *
 * This module contains the chat model and the database operations for chat
 * CRUD and membership queries. Chats are plain membership groups: a chat row
 * plus a `chat_members` join table; messages hang off the chat and are
 * deleted with it.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::auth::users::{User, UserInfo};
use crate::messaging::db::Message;

/// A chat with its member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub members: Vec<UserInfo>,
}

/// Chat-list entry: members plus the most recent message, enough for a
/// client to render its conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub members: Vec<UserInfo>,
    pub last_message: Option<Message>,
}

/// Load the member users of a chat (full rows, including device tokens, for
/// fan-out decisions). Returns `None` when the chat does not exist.
pub async fn get_chat_member_users(
    pool: &PgPool,
    chat_id: i64,
) -> Result<Option<Vec<User>>, sqlx::Error> {
    let chat_exists = sqlx::query("SELECT id FROM chats WHERE id = $1")
        .bind(chat_id)
        .fetch_optional(pool)
        .await?
        .is_some();
    if !chat_exists {
        return Ok(None);
    }

    let members = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.password_hash, u.avatar_path, u.device_token, u.created_at, u.updated_at
        FROM users u
        JOIN chat_members cm ON cm.user_id = u.id
        WHERE cm.chat_id = $1
        ORDER BY u.username
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(members))
}

/// Get a chat by id, with members. Returns `None` when absent.
pub async fn get_chat_by_id(pool: &PgPool, chat_id: i64) -> Result<Option<Chat>, sqlx::Error> {
    let row = sqlx::query("SELECT id, created_at FROM chats WHERE id = $1")
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let members = get_chat_member_users(pool, chat_id)
        .await?
        .unwrap_or_default()
        .into_iter()
        .map(UserInfo::from)
        .collect();

    Ok(Some(Chat {
        id: row.get("id"),
        created_at: row.get("created_at"),
        members,
    }))
}

/// Chat summaries for one user's chat list.
pub async fn get_chats_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ChatSummary>, sqlx::Error> {
    let chat_rows = sqlx::query(
        r#"
        SELECT c.id
        FROM chats c
        JOIN chat_members cm ON cm.chat_id = c.id
        WHERE cm.user_id = $1
        ORDER BY c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut summaries = Vec::with_capacity(chat_rows.len());
    for row in chat_rows {
        let chat_id: i64 = row.get("id");

        let members = get_chat_member_users(pool, chat_id)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(UserInfo::from)
            .collect();

        let last_message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_id, sender_id, text, sent_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY sent_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        summaries.push(ChatSummary {
            id: chat_id,
            members,
            last_message,
        });
    }

    Ok(summaries)
}

/// Find the chat whose member set is exactly the given usernames.
///
/// Returns the first match (member sets are unique in practice but the
/// schema does not enforce it) or `None`.
pub async fn find_chat_by_member_usernames(
    pool: &PgPool,
    usernames: &[String],
) -> Result<Option<Chat>, sqlx::Error> {
    if usernames.is_empty() {
        return Ok(None);
    }

    let mut wanted: Vec<String> = usernames.to_vec();
    wanted.sort();
    wanted.dedup();

    // Candidate chats are those the first user belongs to; the exact-set
    // check then runs per candidate.
    let candidate_rows = sqlx::query(
        r#"
        SELECT DISTINCT cm.chat_id
        FROM chat_members cm
        JOIN users u ON u.id = cm.user_id
        WHERE u.username = $1
        "#,
    )
    .bind(&wanted[0])
    .fetch_all(pool)
    .await?;

    for row in candidate_rows {
        let chat_id: i64 = row.get("chat_id");
        let Some(members) = get_chat_member_users(pool, chat_id).await? else {
            continue;
        };

        let mut member_names: Vec<String> =
            members.iter().map(|user| user.username.clone()).collect();
        member_names.sort();

        if member_names == wanted {
            return get_chat_by_id(pool, chat_id).await;
        }
    }

    Ok(None)
}

/// Create a chat containing the creator plus the named users.
///
/// Unknown usernames are ignored; the creator is always a member. Runs in a
/// transaction so a half-created chat is never visible.
pub async fn create_chat(
    pool: &PgPool,
    creator_id: Uuid,
    member_usernames: &[String],
) -> Result<Chat, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let chat_row = sqlx::query("INSERT INTO chats (created_at) VALUES ($1) RETURNING id")
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
    let chat_id: i64 = chat_row.get("id");

    sqlx::query(
        "INSERT INTO chat_members (chat_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(chat_id)
    .bind(creator_id)
    .execute(&mut *tx)
    .await?;

    for username in member_usernames {
        sqlx::query(
            r#"
            INSERT INTO chat_members (chat_id, user_id)
            SELECT $1, id FROM users WHERE username = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(username)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let chat = get_chat_by_id(pool, chat_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(chat)
}

/// Delete a chat (messages and membership cascade). Returns `false` when the
/// chat did not exist.
pub async fn delete_chat(pool: &PgPool, chat_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chats WHERE id = $1")
        .bind(chat_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
