/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` conversions for Axum state extraction.
 *
 * # Thread Safety
 *
 * Everything here is cheap to clone and safe to share: the database pool is
 * internally pooled, the dispatcher is behind an `Arc`, and the avatar store
 * is a path. Handlers receive clones per request.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dispatch::{spawn_send, ClientUpdate, UpdateDispatcher};
use crate::files::AvatarStore;

/// Application state shared by all request handlers.
///
/// # Fields
///
/// * `db_pool` - optional PostgreSQL pool; `None` when `DATABASE_URL` is not
///   set, in which case data endpoints answer 503
/// * `dispatcher` - the client-update dispatcher; `None` without a database,
///   since recipient resolution needs the users table
/// * `avatars` - local-disk avatar storage
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub dispatcher: Option<Arc<UpdateDispatcher>>,
    pub avatars: AvatarStore,
}

impl AppState {
    /// Fire-and-forget one client update to a user.
    ///
    /// No-op (with a debug log) when dispatch is disabled. Delivery failures
    /// are logged by the dispatch task, never surfaced here.
    pub fn dispatch_to_user(&self, recipient: Uuid, update: ClientUpdate) {
        match &self.dispatcher {
            Some(dispatcher) => spawn_send(dispatcher.clone(), recipient, update),
            None => tracing::debug!(
                "Dispatch disabled, dropping {} update for {}",
                update.action_type.as_str(),
                recipient
            ),
        }
    }
}

/// Allows handlers to extract only the database pool.
impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

/// Allows handlers to extract only the dispatcher.
impl FromRef<AppState> for Option<Arc<UpdateDispatcher>> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatcher.clone()
    }
}

/// Allows handlers to extract only the avatar store.
impl FromRef<AppState> for AvatarStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.avatars.clone()
    }
}
