//! Client update delivery integration tests
//!
//! Exercises the dispatch pipeline end to end with in-memory stand-ins for
//! the token store and the push transport: message fan-out, correlation
//! threading, and failure isolation between recipients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use messenger::auth::users::User;
use messenger::dispatch::{
    ActionType, ClientUpdate, DeviceTokenStore, DispatchError, PushError, PushTransport,
    UpdateDispatcher, UpdatePayload, WireData,
};
use messenger::messaging::db::Message;
use messenger::messaging::handlers::fan_out_message;

/// Token store backed by a plain map.
struct MemoryTokenStore {
    tokens: Mutex<HashMap<Uuid, Option<String>>>,
}

impl MemoryTokenStore {
    fn new(entries: Vec<(Uuid, Option<&str>)>) -> Self {
        Self {
            tokens: Mutex::new(
                entries
                    .into_iter()
                    .map(|(id, token)| (id, token.map(str::to_string)))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl DeviceTokenStore for MemoryTokenStore {
    async fn device_token(&self, user_id: Uuid) -> Result<Option<Option<String>>, sqlx::Error> {
        Ok(self.tokens.lock().unwrap().get(&user_id).cloned())
    }

    async fn store_device_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(entry) = tokens.get_mut(&user_id) {
            *entry = Some(token.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Transport that records every send, optionally rejecting one device.
struct RecordingTransport {
    sent: Mutex<Vec<(String, WireData)>>,
    reject_token: Option<String>,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_token: None,
        }
    }

    fn rejecting(token: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_token: Some(token.to_string()),
        }
    }

    fn sent(&self) -> Vec<(String, WireData)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, device_token: &str, data: WireData) -> Result<(), PushError> {
        if self.reject_token.as_deref() == Some(device_token) {
            return Err(PushError::Rejected(502));
        }
        self.sent
            .lock()
            .unwrap()
            .push((device_token.to_string(), data));
        Ok(())
    }
}

fn test_user(id: Uuid, username: &str, device_token: Option<&str>) -> User {
    let now = Utc::now();
    User {
        id,
        username: username.to_string(),
        password_hash: "hash".to_string(),
        avatar_path: None,
        device_token: device_token.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
}

fn test_message(chat_id: i64, sender_id: Uuid, text: &str) -> Message {
    Message {
        id: 1,
        chat_id,
        sender_id,
        text: text.to_string(),
        sent_at: Utc::now(),
    }
}

fn actions_for<'a>(sent: &'a [(String, WireData)], token: &str) -> Vec<&'a str> {
    sent.iter()
        .filter(|(t, _)| t == token)
        .map(|(_, data)| data["ActionType"].as_str())
        .collect()
}

#[tokio::test]
async fn message_fan_out_reaches_every_member_with_a_token() {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    let store = Arc::new(MemoryTokenStore::new(vec![
        (alice, Some("token-a")),
        (bob, None),
        (carol, Some("token-c")),
    ]));
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = Arc::new(UpdateDispatcher::new(store, transport.clone()));

    let message = test_message(7, alice, "hello");
    let members = vec![
        test_user(alice, "alice", Some("token-a")),
        test_user(bob, "bob", None),
        test_user(carol, "carol", Some("token-c")),
    ];

    fan_out_message(dispatcher, "req-42".to_string(), message, members).await;

    let sent = transport.sent();

    // Sender gets the confirmation, carol gets message + presence, bob
    // (no device) gets nothing.
    assert_eq!(actions_for(&sent, "token-a"), vec!["MessageSent"]);
    assert_eq!(
        actions_for(&sent, "token-c"),
        vec!["MessageReceived", "UserStatusChanged"]
    );
    assert_eq!(sent.len(), 3);

    // Every envelope carries the originating request's correlation token.
    for (_, data) in &sent {
        assert_eq!(data["ActionId"], "req-42");
        assert_eq!(data["IsSuccess"], "true");
    }
}

#[tokio::test]
async fn one_failing_recipient_does_not_block_the_rest() {
    let alice = Uuid::new_v4();
    let carol = Uuid::new_v4();
    let dave = Uuid::new_v4();

    let store = Arc::new(MemoryTokenStore::new(vec![
        (alice, Some("token-a")),
        (carol, Some("token-c")),
        (dave, Some("token-d")),
    ]));
    // carol's device rejects everything
    let transport = Arc::new(RecordingTransport::rejecting("token-c"));
    let dispatcher = Arc::new(UpdateDispatcher::new(store, transport.clone()));

    let message = test_message(7, alice, "hello");
    let members = vec![
        test_user(alice, "alice", Some("token-a")),
        test_user(carol, "carol", Some("token-c")),
        test_user(dave, "dave", Some("token-d")),
    ];

    fan_out_message(dispatcher, "req-43".to_string(), message, members).await;

    let sent = transport.sent();
    assert_eq!(actions_for(&sent, "token-a"), vec!["MessageSent"]);
    assert!(actions_for(&sent, "token-c").is_empty());
    assert_eq!(
        actions_for(&sent, "token-d"),
        vec!["MessageReceived", "UserStatusChanged"]
    );
}

#[tokio::test]
async fn refreshed_token_is_used_for_subsequent_sends() {
    let alice = Uuid::new_v4();

    let store = Arc::new(MemoryTokenStore::new(vec![(alice, Some("old-token"))]));
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = UpdateDispatcher::new(store, transport.clone());

    dispatcher.refresh_token(alice, "new-token").await.unwrap();

    let update = ClientUpdate::success(
        "req-44".to_string(),
        ActionType::UserUpdated,
        UpdatePayload::Text("profile changed".to_string()),
    );
    dispatcher.send_update(alice, &update).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "new-token");
}

#[tokio::test]
async fn unknown_recipient_is_reported_without_a_network_attempt() {
    let store = Arc::new(MemoryTokenStore::new(vec![]));
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = UpdateDispatcher::new(store, transport.clone());

    let update = ClientUpdate::failure("req-45".to_string(), ActionType::ChatUpdated, None);
    let result = dispatcher.send_update(Uuid::new_v4(), &update).await;

    assert!(matches!(
        result,
        Err(DispatchError::RecipientUnresolved(_))
    ));
    assert!(transport.sent().is_empty());
}
