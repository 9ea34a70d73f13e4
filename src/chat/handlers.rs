/**
 * Chat Route Handlers
 *
 * HTTP handlers for chat CRUD and membership queries. Every write (and the
 * read endpoints a client uses to resynchronize) also dispatches client
 * updates: the HTTP response answers the caller, the push channel catches up
 * the caller's device and, for chat creation, every member's device.
 *
 * Dispatch is always fire-and-forget here; the response status reflects only
 * the primary database operation.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::auth::users::UserInfo;
use crate::chat::db::{
    create_chat, delete_chat, find_chat_by_member_usernames, get_chat_by_id,
    get_chat_member_users, get_chats_for_user, Chat, ChatSummary,
};
use crate::dispatch::{ActionType, ClientUpdate, UpdatePayload};
use crate::middleware::auth::AuthUser;
use crate::middleware::correlation::ActionId;
use crate::server::state::AppState;

/// Body of POST /api/chats.
#[derive(Debug, Deserialize)]
pub struct ChatCreationRequest {
    /// Usernames to include besides the creator.
    pub member_usernames: Vec<String>,
}

/// Body of POST /api/chats/lookup.
#[derive(Debug, Deserialize)]
pub struct ChatLookupRequest {
    /// The exact member set of the chat being looked for.
    pub member_usernames: Vec<String>,
}

/// GET /api/chats/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Chat>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[GET] get_chat called with id: {}", chat_id);

    let chat = get_chat_by_id(&pool, chat_id)
        .await
        .map_err(|error| {
            tracing::error!("Database error: {:?}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            tracing::warn!("Chat with id {} not found", chat_id);
            StatusCode::NOT_FOUND
        })?;

    Ok(Json(chat))
}

/// GET /api/chats - the caller's chat list.
///
/// Besides answering, pushes a `ChatListUpdated` update so other listeners
/// on the caller's device converge on the same list.
pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
) -> Result<Json<Vec<ChatSummary>>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[GET] list_chats called for user: {}", user.user_id);

    let chats = get_chats_for_user(&pool, user.user_id).await.map_err(|error| {
        tracing::error!("Database error: {:?}", error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    state.dispatch_to_user(
        user.user_id,
        ClientUpdate::success(
            action_id,
            ActionType::ChatListUpdated,
            UpdatePayload::ChatList(chats.clone()),
        ),
    );

    Ok(Json(chats))
}

/// POST /api/chats/lookup - find a chat by its exact member set.
pub async fn lookup_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Json(request): Json<ChatLookupRequest>,
) -> Result<Json<Chat>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!(
        "[POST] lookup_chat called with members: {:?}",
        request.member_usernames
    );

    let chat = find_chat_by_member_usernames(&pool, &request.member_usernames)
        .await
        .map_err(|error| {
            tracing::error!("Database error: {:?}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match chat {
        Some(chat) => Ok(Json(chat)),
        None => {
            tracing::warn!(
                "No chat with members {:?} found",
                request.member_usernames
            );
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(action_id, ActionType::ChatUpdated, None),
            );
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// GET /api/chats/{id}/members
pub async fn get_chat_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<UserInfo>>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[GET] get_chat_members called with chat id: {}", chat_id);

    let members = get_chat_member_users(&pool, chat_id).await.map_err(|error| {
        tracing::error!("Database error: {:?}", error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(members) = members else {
        tracing::warn!("Chat with id {} not found", chat_id);
        state.dispatch_to_user(
            user.user_id,
            ClientUpdate::failure(action_id, ActionType::ChatUsersUpdated, None),
        );
        return Err(StatusCode::NOT_FOUND);
    };

    let members: Vec<UserInfo> = members.into_iter().map(UserInfo::from).collect();

    state.dispatch_to_user(
        user.user_id,
        ClientUpdate::success(
            action_id,
            ActionType::ChatUsersUpdated,
            UpdatePayload::Users(members.clone()),
        ),
    );

    Ok(Json(members))
}

/// POST /api/chats - create a chat with the caller plus the named users.
///
/// Every member whose device is known gets a `ChatCreated` push.
pub async fn create_chat_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Json(request): Json<ChatCreationRequest>,
) -> Result<(StatusCode, Json<Chat>), StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!(
        "[POST] create_chat called by {} with members: {:?}",
        user.username,
        request.member_usernames
    );

    let chat = match create_chat(&pool, user.user_id, &request.member_usernames).await {
        Ok(chat) => chat,
        Err(error) => {
            tracing::warn!("Chat creation failed: {:?}", error);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(action_id, ActionType::ChatCreated, None),
            );
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Fan out to every member whose device is known. Skipping the token-less
    // here avoids a guaranteed-unresolved dispatch per such member.
    if let Ok(Some(members)) = get_chat_member_users(&pool, chat.id).await {
        for member in members {
            if member.device_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
                continue;
            }
            state.dispatch_to_user(
                member.id,
                ClientUpdate::success(
                    action_id.clone(),
                    ActionType::ChatCreated,
                    UpdatePayload::Chat(chat.clone()),
                ),
            );
        }
    }

    Ok((StatusCode::CREATED, Json(chat)))
}

/// DELETE /api/chats/{id}
pub async fn delete_chat_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Path(chat_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[DELETE] delete_chat called with chat id: {}", chat_id);

    match delete_chat(&pool, chat_id).await {
        Ok(true) => {
            tracing::info!("Chat {} deleted", chat_id);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::success(action_id, ActionType::ChatDeleted, UpdatePayload::Id(chat_id)),
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => {
            tracing::warn!("Chat {} not found for deletion", chat_id);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(
                    action_id,
                    ActionType::ChatDeleted,
                    Some(UpdatePayload::Id(chat_id)),
                ),
            );
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Chat deletion failed: {:?}", error);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(
                    action_id,
                    ActionType::ChatDeleted,
                    Some(UpdatePayload::Id(chat_id)),
                ),
            );
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
