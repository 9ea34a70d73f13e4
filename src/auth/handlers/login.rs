/**
 * Login Handler
 *
 * This module implements the user authentication handler for
 * POST /api/auth/login.
 *
 * # Authentication Process
 *
 * 1. Look up the user by username
 * 2. Verify the password with bcrypt
 * 3. Store the supplied device token (last-write-wins, one token per user)
 * 4. Generate a JWT token
 * 5. Fire-and-forget a `UserLoggedIn` push
 *
 * A failed login can still be pushed: when the request body carries a device
 * token, an unsuccessful `UserLoggedIn` update is sent straight to that
 * token, since the caller has no authenticated identity to address.
 *
 * # Security
 *
 * - Invalid credentials return the same 401 for unknown user and wrong
 *   password, to prevent user enumeration
 * - Passwords are never logged or returned in responses
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::verify;

use crate::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::auth::sessions::create_token;
use crate::auth::users::{get_user_by_username, UserInfo};
use crate::dispatch::{spawn_send, spawn_send_to_token, ActionType, ClientUpdate, UpdatePayload};
use crate::middleware::correlation::ActionId;
use crate::server::state::AppState;

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - unknown user or wrong password
/// * `503 Service Unavailable` - database not configured
/// * `500 Internal Server Error` - database or token generation failure
pub async fn login(
    State(state): State<AppState>,
    ActionId(action_id): ActionId,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, StatusCode> {
    let pool = state.db_pool.clone().ok_or_else(|| {
        tracing::error!("Database not configured");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    tracing::info!("Login request for: {}", request.username);

    let user = get_user_by_username(&pool, &request.username)
        .await
        .map_err(|error| {
            tracing::error!("Database error: {:?}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(user) = user else {
        tracing::warn!("User not found: {}", request.username);
        notify_failure(&state, &request.device_token, &action_id);
        return Err(StatusCode::UNAUTHORIZED);
    };

    let valid = verify(&request.password, &user.password_hash).map_err(|error| {
        tracing::error!("Password verification error: {:?}", error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !valid {
        tracing::warn!("Invalid password for user: {}", request.username);
        notify_failure(&state, &request.device_token, &action_id);
        return Err(StatusCode::UNAUTHORIZED);
    }

    // Logging in from a device makes that device the user's push target.
    // A refresh failure only degrades push delivery, never the login itself.
    if let (Some(dispatcher), Some(device_token)) = (&state.dispatcher, &request.device_token) {
        if let Err(error) = dispatcher.refresh_token(user.id, device_token).await {
            tracing::warn!("Failed to store device token at login: {}", error);
        }
    }

    let token = create_token(user.id, user.username.clone()).map_err(|error| {
        tracing::error!("Failed to create token: {:?}", error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("User logged in successfully: {}", user.username);

    if let Some(dispatcher) = &state.dispatcher {
        let update = ClientUpdate::success(
            action_id,
            ActionType::UserLoggedIn,
            UpdatePayload::User(UserInfo::from(&user)),
        );
        match &request.device_token {
            Some(device_token) => {
                spawn_send_to_token(dispatcher.clone(), device_token.clone(), update)
            }
            // No token in the body: try whatever token an earlier session
            // stored. An unresolved recipient is just logged.
            None => spawn_send(dispatcher.clone(), user.id, update),
        }
    }

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Push an unsuccessful `UserLoggedIn` update to the token the caller
/// supplied, if any. Pre-authentication, so the token comes from the body.
fn notify_failure(state: &AppState, device_token: &Option<String>, action_id: &str) {
    if let (Some(dispatcher), Some(token)) = (&state.dispatcher, device_token) {
        spawn_send_to_token(
            dispatcher.clone(),
            token.clone(),
            ClientUpdate::failure(
                action_id,
                ActionType::UserLoggedIn,
                Some(UpdatePayload::Text("Invalid login attempt".to_string())),
            ),
        );
    }
}
