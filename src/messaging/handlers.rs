/**
 * Message Route Handlers
 *
 * HTTP handlers for reading, sending, and deleting messages, plus the
 * per-recipient fan-out that follows a successful send.
 *
 * # Fan-out
 *
 * Sending a message triggers one dispatch per interested device:
 *
 * - the sender gets a `MessageSent` confirmation,
 * - every other chat member with a known device gets `MessageReceived`
 *   followed by a `UserStatusChanged(Online)` notice about the sender.
 *
 * Members without a stored device token are skipped. Each dispatch is
 * independent: a failed send to one member is logged and the loop moves on,
 * and none of it can affect the already-committed message row or the HTTP
 * response.
 */

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::auth::users::User;
use crate::chat::db::get_chat_member_users;
use crate::dispatch::{
    ActionType, ClientUpdate, StatusType, UpdateDispatcher, UpdatePayload, UserStatus,
};
use crate::messaging::db::{create_message, delete_message, get_messages_by_chat_id, Message};
use crate::middleware::auth::AuthUser;
use crate::middleware::correlation::ActionId;
use crate::server::state::AppState;

/// Body of POST /api/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
}

/// GET /api/chats/{id}/messages
///
/// Returns the chat's messages and pushes the same list to the caller as a
/// `ChatMessagesUpdated` update.
pub async fn get_chat_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[GET] get_chat_messages called with chat id: {}", chat_id);

    let messages = get_messages_by_chat_id(&pool, chat_id).await.map_err(|error| {
        tracing::error!("Database error: {:?}", error);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    state.dispatch_to_user(
        user.user_id,
        ClientUpdate::success(
            action_id,
            ActionType::ChatMessagesUpdated,
            UpdatePayload::Messages(messages.clone()),
        ),
    );

    Ok(Json(messages))
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!(
        "[POST] send_message called by {} for chat {}",
        user.username,
        request.chat_id
    );

    let message = match create_message(&pool, request.chat_id, user.user_id, &request.text).await {
        Ok(message) => message,
        Err(error) => {
            tracing::warn!("Message creation failed: {:?}", error);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(
                    action_id,
                    ActionType::MessageSent,
                    Some(UpdatePayload::Text("Message creation failed".to_string())),
                ),
            );
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // The message row is committed; everything from here on is best-effort
    // push delivery on a detached task.
    if let Some(dispatcher) = state.dispatcher.clone() {
        let members = get_chat_member_users(&pool, message.chat_id)
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        tokio::spawn(fan_out_message(
            dispatcher,
            action_id,
            message.clone(),
            members,
        ));
    }

    Ok(Json(message))
}

/// DELETE /api/messages/{id}
pub async fn delete_message_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ActionId(action_id): ActionId,
    Path(message_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let pool = state.db_pool.clone().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    tracing::info!("[DELETE] delete_message called with id: {}", message_id);

    match delete_message(&pool, message_id).await {
        Ok(true) => {
            tracing::info!("Message {} deleted", message_id);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::success(
                    action_id,
                    ActionType::MessageDeleted,
                    UpdatePayload::Id(message_id),
                ),
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => {
            tracing::warn!("Message {} not found for deletion", message_id);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(
                    action_id,
                    ActionType::MessageDeleted,
                    Some(UpdatePayload::Text("Message deletion failed".to_string())),
                ),
            );
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Message deletion failed: {:?}", error);
            state.dispatch_to_user(
                user.user_id,
                ClientUpdate::failure(
                    action_id,
                    ActionType::MessageDeleted,
                    Some(UpdatePayload::Text("Message deletion failed".to_string())),
                ),
            );
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Deliver the per-recipient updates for one freshly sent message.
///
/// One dispatch per recipient, each independent: failures are logged and the
/// remaining recipients still get their attempt. Members without a device
/// token are skipped entirely (no resolution round-trip for a recipient that
/// is known to be unreachable).
pub async fn fan_out_message(
    dispatcher: Arc<UpdateDispatcher>,
    action_id: String,
    message: Message,
    members: Vec<User>,
) {
    // Confirmation to the sender first.
    let confirmation = ClientUpdate::success(
        action_id.clone(),
        ActionType::MessageSent,
        UpdatePayload::Message(message.clone()),
    );
    if let Err(error) = dispatcher.send_update(message.sender_id, &confirmation).await {
        tracing::warn!(
            "Dropping MessageSent confirmation for {}: {}",
            message.sender_id,
            error
        );
    }

    for member in members {
        if member.id == message.sender_id {
            continue;
        }
        let has_token = member
            .device_token
            .as_deref()
            .map_or(false, |token| !token.trim().is_empty());
        if !has_token {
            tracing::debug!("Skipping member {} with no device token", member.id);
            continue;
        }

        let received = ClientUpdate::success(
            action_id.clone(),
            ActionType::MessageReceived,
            UpdatePayload::Message(message.clone()),
        );
        if let Err(error) = dispatcher.send_update(member.id, &received).await {
            tracing::warn!("Dropping MessageReceived for {}: {}", member.id, error);
        }

        // Receiving a message doubles as a presence signal for the sender.
        let presence = ClientUpdate::success(
            action_id.clone(),
            ActionType::UserStatusChanged,
            UpdatePayload::Status(UserStatus {
                user_id: message.sender_id,
                status: StatusType::Online,
            }),
        );
        if let Err(error) = dispatcher.send_update(member.id, &presence).await {
            tracing::warn!("Dropping UserStatusChanged for {}: {}", member.id, error);
        }
    }
}
