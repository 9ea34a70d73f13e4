/**
 * API Route Handlers
 *
 * This module wires handlers onto route paths. Routes are split into a
 * public set (registration, login) and a protected set behind the JWT auth
 * middleware.
 *
 * # Routes
 *
 * ## Authentication
 * - `POST /api/auth/register` - User registration
 * - `POST /api/auth/login` - User login
 * - `GET /api/auth/me` - Get current user info (protected)
 * - `GET /api/auth/check` - Token validity probe (protected)
 *
 * ## Chats (protected)
 * - `GET /api/chats` - Caller's chat list
 * - `POST /api/chats` - Create a chat
 * - `POST /api/chats/lookup` - Find a chat by its exact member set
 * - `GET /api/chats/{id}` - Chat details
 * - `DELETE /api/chats/{id}` - Delete a chat
 * - `GET /api/chats/{id}/members` - Chat member list
 * - `GET /api/chats/{id}/messages` - Chat message history
 *
 * ## Messages (protected)
 * - `POST /api/messages` - Send a message
 * - `DELETE /api/messages/{id}` - Delete a message
 *
 * ## Client device (protected)
 * - `POST /api/client/refresh-token` - Store the caller's push token
 * - `POST /api/users/avatar` - Upload an avatar image
 */

use axum::{middleware::from_fn_with_state, routing, Router};

use crate::auth::handlers::{check_auth, get_me, login, register};
use crate::chat::handlers::{
    create_chat_handler, delete_chat_handler, get_chat, get_chat_members, list_chats, lookup_chat,
};
use crate::client::handlers::{refresh_device_token, upload_avatar};
use crate::messaging::handlers::{delete_message_handler, get_chat_messages, send_message};
use crate::middleware::auth::auth_middleware;
use crate::server::state::AppState;

/// Routes reachable without a bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", routing::post(register))
        .route("/api/auth/login", routing::post(login))
}

/// Routes behind the JWT auth middleware.
///
/// The middleware runs as a `route_layer`, so it applies only to routes that
/// actually match here and unknown paths still fall through to the 404
/// fallback instead of answering 401.
pub fn protected_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", routing::get(get_me))
        .route("/api/auth/check", routing::get(check_auth))
        .route(
            "/api/chats",
            routing::get(list_chats).post(create_chat_handler),
        )
        .route("/api/chats/lookup", routing::post(lookup_chat))
        .route(
            "/api/chats/{id}",
            routing::get(get_chat).delete(delete_chat_handler),
        )
        .route("/api/chats/{id}/members", routing::get(get_chat_members))
        .route("/api/chats/{id}/messages", routing::get(get_chat_messages))
        .route("/api/messages", routing::post(send_message))
        .route("/api/messages/{id}", routing::delete(delete_message_handler))
        .route("/api/client/refresh-token", routing::post(refresh_device_token))
        .route("/api/users/avatar", routing::post(upload_avatar))
        .route_layer(from_fn_with_state(app_state, auth_middleware))
}
