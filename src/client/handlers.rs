/**
 * Client Device Handlers
 *
 * Handlers for per-device client state: the push device token and the
 * user's avatar image.
 *
 * Both return `ApiError` so failures come back as JSON error bodies rather
 * than bare status codes.
 */

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::auth::users::{update_avatar_path, UserInfo};
use crate::dispatch::{ActionType, ClientUpdate, UpdatePayload};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::correlation::ActionId;
use crate::server::state::AppState;

/// Body of POST /api/client/refresh-token.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub device_token: String,
}

/// POST /api/client/refresh-token - store the caller's current push token.
///
/// Last write wins: a user logging in on a new device simply overwrites the
/// previous token.
///
/// # Errors
///
/// * `404 Not Found` - the token's user no longer exists
/// * `503 Service Unavailable` - dispatch not configured
pub async fn refresh_device_token(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let dispatcher = state.dispatcher.clone().ok_or_else(|| {
        ApiError::handler(StatusCode::SERVICE_UNAVAILABLE, "Dispatch not configured")
    })?;
    tracing::info!("[POST] refresh_device_token called by {}", user.user_id);

    dispatcher
        .refresh_token(user.user_id, &request.device_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/avatar - upload a new avatar image.
///
/// Accepts a multipart form with an `avatar` file field, stores the bytes on
/// disk under a fresh name, records the public path on the user row, and
/// pushes a `UserUpdated` update so the caller's devices pick up the new
/// image.
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    mut multipart: Multipart,
) -> Result<Json<UserInfo>, ApiError> {
    let pool = state.db_pool.clone().ok_or_else(|| {
        ApiError::handler(StatusCode::SERVICE_UNAVAILABLE, "Database not configured")
    })?;
    tracing::info!("[POST] upload_avatar called by {}", user.username);

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|error| {
        ApiError::handler(
            StatusCode::BAD_REQUEST,
            format!("Malformed multipart body: {error}"),
        )
    })? {
        if field.name() != Some("avatar") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("avatar").to_string();
        let bytes = field.bytes().await.map_err(|error| {
            ApiError::handler(
                StatusCode::BAD_REQUEST,
                format!("Failed to read avatar field: {error}"),
            )
        })?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        ApiError::handler(StatusCode::BAD_REQUEST, "Missing avatar field")
    })?;
    if bytes.is_empty() {
        return Err(ApiError::handler(StatusCode::BAD_REQUEST, "Empty avatar file"));
    }

    let avatar_path = state.avatars.save(&file_name, &bytes).await?;
    let updated = update_avatar_path(&pool, user.user_id, &avatar_path).await?;
    let info = UserInfo::from(&updated);

    state.dispatch_to_user(
        user.user_id,
        ClientUpdate::success(
            action_id,
            ActionType::UserUpdated,
            UpdatePayload::User(info.clone()),
        ),
    );

    Ok(Json(info))
}
