/**
 * Registration Handler
 *
 * This module implements the user registration handler for
 * POST /api/auth/register.
 *
 * # Registration Process
 *
 * 1. Validate username format and password length
 * 2. Check that the username is free
 * 3. Hash the password with bcrypt
 * 4. Create the user (storing the supplied device token, if any)
 * 5. Generate a JWT token
 * 6. Fire-and-forget a `UserRegistered` push to the supplied device token
 *
 * The push in step 6 uses the token from the request body because a client
 * that is only now registering has no user id the dispatcher could resolve.
 * Push delivery is best-effort and never affects the HTTP response.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, DEFAULT_COST};

use crate::auth::handlers::types::{AuthResponse, RegisterRequest, UserResponse};
use crate::auth::sessions::create_token;
use crate::auth::users::{create_user, get_user_by_username, UserInfo};
use crate::dispatch::{spawn_send_to_token, ActionType, ClientUpdate, UpdatePayload};
use crate::middleware::correlation::ActionId;
use crate::server::state::AppState;

/// Validate username format
///
/// Usernames must be:
/// - 3-30 characters long
/// - Contain only alphanumeric characters and underscores
/// - Start with a letter
fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Registration handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username or password format
/// * `409 Conflict` - username already taken
/// * `503 Service Unavailable` - database not configured
/// * `500 Internal Server Error` - hashing, insertion, or token generation failed
pub async fn register(
    State(state): State<AppState>,
    ActionId(action_id): ActionId,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let pool = state.db_pool.clone().ok_or_else(|| {
        tracing::error!("Database not configured");
        (StatusCode::SERVICE_UNAVAILABLE, "Database not configured".to_string())
    })?;
    tracing::info!("Registration request for username: {}", request.username);

    if !is_valid_username(&request.username) {
        tracing::warn!("Invalid username format: {}", request.username);
        return Err((
            StatusCode::BAD_REQUEST,
            "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores".to_string(),
        ));
    }

    if request.password.len() < 8 {
        tracing::warn!("Password too short");
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if let Ok(Some(_)) = get_user_by_username(&pool, &request.username).await {
        tracing::warn!("Username already exists: {}", request.username);
        notify_failure(&state, &request.device_token, &action_id, "Username already taken");
        return Err((StatusCode::CONFLICT, "Username already taken".to_string()));
    }

    let password_hash = hash(&request.password, DEFAULT_COST).map_err(|error| {
        tracing::error!("Failed to hash password: {:?}", error);
        (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
    })?;

    let user = create_user(
        &pool,
        &request.username,
        &password_hash,
        request.device_token.as_deref(),
    )
    .await
    .map_err(|error| {
        tracing::error!("Failed to create user: {:?}", error);
        notify_failure(&state, &request.device_token, &action_id, "Registration failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
    })?;

    let token = create_token(user.id, user.username.clone()).map_err(|error| {
        tracing::error!("Failed to create token: {:?}", error);
        (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
    })?;

    tracing::info!("User created successfully: {}", user.username);

    // Push the registration result to the device the client named. The
    // response below already carries everything; this is for other listeners
    // on the same device (best-effort).
    if let (Some(dispatcher), Some(device_token)) = (&state.dispatcher, &request.device_token) {
        spawn_send_to_token(
            dispatcher.clone(),
            device_token.clone(),
            ClientUpdate::success(
                action_id,
                ActionType::UserRegistered,
                UpdatePayload::User(UserInfo::from(&user)),
            ),
        );
    }

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Push an unsuccessful `UserRegistered` update when the client supplied a
/// device token. Best-effort; never changes the HTTP outcome.
fn notify_failure(state: &AppState, device_token: &Option<String>, action_id: &str, reason: &str) {
    if let (Some(dispatcher), Some(token)) = (&state.dispatcher, device_token) {
        spawn_send_to_token(
            dispatcher.clone(),
            token.clone(),
            ClientUpdate::failure(
                action_id,
                ActionType::UserRegistered,
                Some(UpdatePayload::Text(reason.to_string())),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_usernames() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("bob_42"));
        assert!(is_valid_username("Abc"));
    }

    #[test]
    fn invalid_usernames() {
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("1abc"));
        assert!(!is_valid_username("_abc"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(31)));
    }
}
