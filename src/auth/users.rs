/**
 * User Model and Database Operations
 *
 * This module handles user data and database operations.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique, 3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    /// Path of the stored avatar image, if one was uploaded
    pub avatar_path: Option<String>,
    /// Most recent device token for push delivery (one per user, overwritten)
    pub device_token: Option<String>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, safe to return to clients and to embed in client
/// update payloads. Never contains the password hash or device token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub avatar_path: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar_path: user.avatar_path.clone(),
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_path: user.avatar_path,
        }
    }
}

/// Create a new user
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `username` - User's chosen username
/// * `password_hash` - Hashed password
/// * `device_token` - Device token supplied at registration, if any
///
/// # Returns
/// Created user or error
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    device_token: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash, avatar_path, device_token, created_at, updated_at)
        VALUES ($1, $2, $3, NULL, $4, $5, $6)
        RETURNING id, username, password_hash, avatar_path, device_token, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(password_hash)
    .bind(device_token)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get user by username
pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, avatar_path, device_token, created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, avatar_path, device_token, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Update a user's avatar path
///
/// # Returns
/// Updated user or error
pub async fn update_avatar_path(
    pool: &PgPool,
    user_id: Uuid,
    avatar_path: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET avatar_path = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, username, password_hash, avatar_path, device_token, created_at, updated_at
        "#,
    )
    .bind(avatar_path)
    .bind(now)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_strips_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$2b$...".to_string(),
            avatar_path: Some("/static/avatars/a.png".to_string()),
            device_token: Some("secret-token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let info = UserInfo::from(&user);
        assert_eq!(info.username, "alice");
        assert_eq!(info.avatar_path.as_deref(), Some("/static/avatars/a.png"));

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("password"));
    }
}
