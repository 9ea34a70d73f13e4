/**
 * Authentication Request/Response Types
 *
 * Shared request and response shapes for the authentication endpoints.
 */

use serde::{Deserialize, Serialize};

use crate::auth::users::User;

/// Registration request body.
///
/// `device_token` is optional: clients that want the registration result
/// pushed back to them include their push token here, since they are not yet
/// addressable by user id.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub device_token: Option<String>,
}

/// Login request body. `device_token`, when present, becomes the user's
/// current (and only) stored push token.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub device_token: Option<String>,
}

/// User info returned by auth endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub avatar_path: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            avatar_path: user.avatar_path.clone(),
        }
    }
}

/// Response for successful register/login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
