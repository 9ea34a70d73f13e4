/**
 * Update Dispatcher
 *
 * This module implements the single abstraction all write handlers use to
 * deliver one `ClientUpdate` to one recipient. A recipient is addressed
 * either by user id (resolved to the user's current device token) or by a
 * device token supplied directly, which pre-authentication flows use because
 * the client is not yet addressable by id.
 *
 * # Delivery model
 *
 * Each send is one outbound call to the push transport: no retries, no
 * batching, no deduplication, no queueing. Fan-out to multiple recipients is
 * the caller's responsibility; callers issue one dispatch per recipient and
 * skip recipients with no known token. The channel is best-effort, so
 * handlers fire dispatches from detached tasks (`spawn_send` /
 * `spawn_send_to_token`) and failures are logged rather than surfaced to the
 * HTTP caller.
 *
 * The dispatcher is stateless per call. The only state it touches is the
 * per-user device token in the external store, where concurrent refreshes
 * resolve as last-write-wins.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::dispatch::envelope::ClientUpdate;
use crate::dispatch::transport::{PushError, PushTransport};
use crate::dispatch::wire::serialize_update;

/// Errors raised synchronously by dispatcher operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The recipient does not exist or has no stored device token.
    #[error("recipient {0} has no resolvable device token")]
    RecipientUnresolved(Uuid),

    /// The token store could not be read or written.
    #[error("device token store error: {0}")]
    Store(#[from] sqlx::Error),

    /// The push transport refused or failed the send.
    #[error(transparent)]
    Transport(#[from] PushError),
}

/// Resolution of user ids to device tokens.
///
/// The production implementation reads the `users` table; tests substitute
/// an in-memory map.
#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// Look up a user's current device token.
    ///
    /// `Ok(None)` means the user does not exist; `Ok(Some(None))` means the
    /// user exists but has never registered a token.
    async fn device_token(&self, user_id: Uuid) -> Result<Option<Option<String>>, sqlx::Error>;

    /// Overwrite a user's device token. Returns `false` when the user does
    /// not exist. Only the most recent token is retained.
    async fn store_device_token(&self, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error>;
}

/// Token store backed by the `users` table.
pub struct PgDeviceTokenStore {
    pool: PgPool,
}

impl PgDeviceTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceTokenStore for PgDeviceTokenStore {
    async fn device_token(&self, user_id: Uuid) -> Result<Option<Option<String>>, sqlx::Error> {
        let row = sqlx::query("SELECT device_token FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("device_token")))
    }

    async fn store_device_token(&self, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET device_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Delivers client updates to single recipients via the push transport.
pub struct UpdateDispatcher {
    tokens: Arc<dyn DeviceTokenStore>,
    transport: Arc<dyn PushTransport>,
}

impl UpdateDispatcher {
    pub fn new(tokens: Arc<dyn DeviceTokenStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self { tokens, transport }
    }

    /// Deliver one update to a user, resolving their current device token.
    ///
    /// # Errors
    ///
    /// `RecipientUnresolved` when the user is unknown or has no token; in
    /// that case no network call is made.
    pub async fn send_update(&self, user_id: Uuid, update: &ClientUpdate) -> Result<(), DispatchError> {
        let token = self
            .tokens
            .device_token(user_id)
            .await?
            .flatten()
            .filter(|token| !token.trim().is_empty())
            .ok_or(DispatchError::RecipientUnresolved(user_id))?;

        self.transport.send(&token, serialize_update(update)).await?;
        tracing::debug!(
            "Dispatched {} update to user {}",
            update.action_type.as_str(),
            user_id
        );
        Ok(())
    }

    /// Deliver one update directly to a caller-supplied device token.
    ///
    /// Used when the recipient is not yet an authenticated identity, e.g.
    /// the registration result or a failed login, where the client sends its
    /// own token in the request body.
    pub async fn send_update_with_token(
        &self,
        device_token: &str,
        update: &ClientUpdate,
    ) -> Result<(), DispatchError> {
        self.transport
            .send(device_token, serialize_update(update))
            .await?;
        tracing::debug!(
            "Dispatched {} update to caller-supplied token",
            update.action_type.as_str()
        );
        Ok(())
    }

    /// Persist a new device token for a user, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// `RecipientUnresolved` when the user does not exist.
    pub async fn refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), DispatchError> {
        let updated = self.tokens.store_device_token(user_id, token).await?;
        if !updated {
            return Err(DispatchError::RecipientUnresolved(user_id));
        }
        tracing::info!("Refreshed device token for user {}", user_id);
        Ok(())
    }
}

/// Fire-and-forget dispatch to a user id.
///
/// The send runs on a detached task so the caller's response is never
/// blocked on push delivery and an aborted request cannot cancel it.
/// Failures are logged as warnings; the update channel is best-effort.
pub fn spawn_send(dispatcher: Arc<UpdateDispatcher>, recipient: Uuid, update: ClientUpdate) {
    tokio::spawn(async move {
        if let Err(error) = dispatcher.send_update(recipient, &update).await {
            tracing::warn!(
                "Dropping {} update for user {}: {}",
                update.action_type.as_str(),
                recipient,
                error
            );
        }
    });
}

/// Fire-and-forget dispatch to a caller-supplied device token.
pub fn spawn_send_to_token(dispatcher: Arc<UpdateDispatcher>, device_token: String, update: ClientUpdate) {
    tokio::spawn(async move {
        if let Err(error) = dispatcher.send_update_with_token(&device_token, &update).await {
            tracing::warn!(
                "Dropping {} update for caller-supplied token: {}",
                update.action_type.as_str(),
                error
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::envelope::{ActionType, UpdatePayload};
    use crate::dispatch::wire::WireData;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory token store for unit tests.
    struct MemoryTokenStore {
        tokens: Mutex<HashMap<Uuid, Option<String>>>,
    }

    impl MemoryTokenStore {
        fn new() -> Self {
            Self {
                tokens: Mutex::new(HashMap::new()),
            }
        }

        fn with_user(self, user_id: Uuid, token: Option<&str>) -> Self {
            self.tokens
                .lock()
                .unwrap()
                .insert(user_id, token.map(str::to_string));
            self
        }
    }

    #[async_trait]
    impl DeviceTokenStore for MemoryTokenStore {
        async fn device_token(&self, user_id: Uuid) -> Result<Option<Option<String>>, sqlx::Error> {
            Ok(self.tokens.lock().unwrap().get(&user_id).cloned())
        }

        async fn store_device_token(&self, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.get_mut(&user_id) {
                Some(slot) => {
                    *slot = Some(token.to_string());
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    /// Transport that records every send.
    struct RecordingTransport {
        sent: Mutex<Vec<(String, WireData)>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(String, WireData)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn send(&self, device_token: &str, data: WireData) -> Result<(), PushError> {
            self.sent
                .lock()
                .unwrap()
                .push((device_token.to_string(), data));
            Ok(())
        }
    }

    fn update(action_id: &str) -> ClientUpdate {
        ClientUpdate::success(action_id, ActionType::ChatDeleted, UpdatePayload::Id(1))
    }

    #[tokio::test]
    async fn send_update_resolves_token_and_pushes_once() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryTokenStore::new().with_user(user, Some("tok-1")));
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport.clone());

        dispatcher.send_update(user, &update("abc123")).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "tok-1");
        assert_eq!(sent[0].1["ActionId"], "abc123");
    }

    #[tokio::test]
    async fn send_update_without_token_makes_no_network_call() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryTokenStore::new().with_user(user, None));
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport.clone());

        let error = dispatcher.send_update(user, &update("x")).await.unwrap_err();

        assert_matches!(error, DispatchError::RecipientUnresolved(id) if id == user);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn send_update_for_unknown_user_is_unresolved() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport.clone());

        let error = dispatcher
            .send_update(Uuid::new_v4(), &update("x"))
            .await
            .unwrap_err();

        assert_matches!(error, DispatchError::RecipientUnresolved(_));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn blank_stored_token_counts_as_unresolved() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryTokenStore::new().with_user(user, Some("   ")));
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport.clone());

        let error = dispatcher.send_update(user, &update("x")).await.unwrap_err();
        assert_matches!(error, DispatchError::RecipientUnresolved(_));
    }

    #[tokio::test]
    async fn send_update_with_token_bypasses_resolution() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport.clone());

        dispatcher
            .send_update_with_token("raw-token", &update("reg-1"))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "raw-token");
        assert_eq!(sent[0].1["ActionId"], "reg-1");
    }

    #[tokio::test]
    async fn refresh_token_is_last_write_wins() {
        let user = Uuid::new_v4();
        let store = Arc::new(MemoryTokenStore::new().with_user(user, Some("t1")));
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store.clone(), transport.clone());

        dispatcher.refresh_token(user, "t2").await.unwrap();
        dispatcher.refresh_token(user, "t3").await.unwrap();

        dispatcher.send_update(user, &update("x")).await.unwrap();
        assert_eq!(transport.sent()[0].0, "t3");
    }

    #[tokio::test]
    async fn refresh_token_for_unknown_user_fails() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = UpdateDispatcher::new(store, transport);

        let error = dispatcher
            .refresh_token(Uuid::new_v4(), "t1")
            .await
            .unwrap_err();
        assert_matches!(error, DispatchError::RecipientUnresolved(_));
    }
}
