/**
 * Current User Handlers
 *
 * Handlers for GET /api/auth/me and GET /api/auth/check. Both sit behind the
 * auth middleware, so reaching them at all means the bearer token verified.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::auth::handlers::types::UserResponse;
use crate::auth::users::get_user_by_id;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

/// Return the currently authenticated user's info.
///
/// # Errors
///
/// * `404 Not Found` - the token's user no longer exists
/// * `503 Service Unavailable` - database not configured
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserResponse>, StatusCode> {
    let pool = state.db_pool.clone().ok_or_else(|| {
        tracing::error!("Database not configured");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let record = get_user_by_id(&pool, user.user_id)
        .await
        .map_err(|error| {
            tracing::error!("Database error: {:?}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            tracing::warn!("User {} not found", user.user_id);
            StatusCode::NOT_FOUND
        })?;

    Ok(Json(UserResponse::from(&record)))
}

/// Cheap token-validity probe: 200 when the bearer token verified.
pub async fn check_auth(AuthUser(user): AuthUser) -> StatusCode {
    tracing::debug!("Auth check for user {}", user.user_id);
    StatusCode::OK
}
