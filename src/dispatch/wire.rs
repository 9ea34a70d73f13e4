/**
 * Envelope Wire Serializer
 *
 * This module flattens a `ClientUpdate` into the string-to-string mapping the
 * push transport requires. The flatten is shallow: exactly the four envelope
 * fields become keys, and the payload is encoded as one structured-text
 * value under `ActionData`.
 *
 * # Encoding rules
 *
 * - `ActionId` is emitted verbatim (string values are never quoted).
 * - `ActionType` is emitted as the symbolic enum name.
 * - `IsSuccess` is emitted as `"true"` / `"false"`.
 * - A missing payload is emitted as the literal string `"null"`.
 * - A text payload is emitted verbatim.
 * - Every other payload is JSON-encoded, with nesting depth bounded so that
 *   pathological object graphs are pruned instead of recursing without bound.
 *
 * # Failure policy
 *
 * Serialization never fails. A payload that cannot be JSON-encoded degrades
 * to its debug rendering; the caller always receives a complete mapping.
 * Receivers must look values up by key, never by position.
 */

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::envelope::{ClientUpdate, UpdatePayload};

/// The flat wire shape consumed by the push transport.
pub type WireData = BTreeMap<String, String>;

/// Nesting levels kept when encoding a payload. Edges below this depth are
/// elided (replaced with null) so encoding always terminates.
const MAX_ENCODE_DEPTH: usize = 32;

/// Flatten an envelope into the wire mapping.
///
/// Produces exactly the keys `ActionId`, `ActionType`, `IsSuccess`, and
/// `ActionData`. Infallible by construction.
pub fn serialize_update(update: &ClientUpdate) -> WireData {
    let mut data = WireData::new();
    data.insert("ActionId".to_string(), update.action_id.clone());
    data.insert("ActionType".to_string(), update.action_type.as_str().to_string());
    data.insert("IsSuccess".to_string(), update.is_success.to_string());
    data.insert("ActionData".to_string(), payload_value(update.action_data.as_ref()));
    data
}

/// Encode the payload slot of an envelope.
fn payload_value(payload: Option<&UpdatePayload>) -> String {
    let Some(payload) = payload else {
        return "null".to_string();
    };

    // Exhaustive over the payload taxonomy: adding a variant without deciding
    // its wire encoding is a compile error.
    match payload {
        UpdatePayload::Text(text) => text.clone(),
        UpdatePayload::Message(message) => encode(message),
        UpdatePayload::Messages(messages) => encode(messages),
        UpdatePayload::Chat(chat) => encode(chat),
        UpdatePayload::ChatList(chats) => encode(chats),
        UpdatePayload::Users(users) => encode(users),
        UpdatePayload::User(user) => encode(user),
        UpdatePayload::Status(status) => encode(status),
        UpdatePayload::Id(id) => encode(id),
    }
}

/// Structured-text encoding of one payload value.
///
/// Falls back to the debug rendering if JSON encoding is impossible, so there
/// is no error path to propagate.
fn encode<T: Serialize + Debug>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(json) => {
            let bounded = bound_depth(json, MAX_ENCODE_DEPTH);
            serde_json::to_string(&bounded).unwrap_or_else(|_| format!("{value:?}"))
        }
        Err(_) => format!("{value:?}"),
    }
}

/// Prune a JSON tree to a maximum nesting depth.
///
/// Anything nested deeper than `depth` levels is replaced with null, which
/// guarantees termination even for values whose serialization expands into
/// an arbitrarily deep graph.
fn bound_depth(value: Value, depth: usize) -> Value {
    if depth == 0 {
        return Value::Null;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| bound_depth(item, depth - 1))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, item)| (key, bound_depth(item, depth - 1)))
                .collect(),
        ),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::envelope::{ActionType, StatusType, UserStatus};
    use crate::messaging::db::Message;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn sample_message() -> Message {
        Message {
            id: 5,
            chat_id: 9,
            sender_id: Uuid::nil(),
            text: "hello".to_string(),
            sent_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn envelope_flattens_to_exactly_four_keys() {
        let update = ClientUpdate::success(
            "abc123",
            ActionType::MessageSent,
            UpdatePayload::Message(sample_message()),
        );
        let data = serialize_update(&update);

        assert_eq!(data.len(), 4);
        assert_eq!(data["ActionId"], "abc123");
        assert_eq!(data["ActionType"], "MessageSent");
        assert_eq!(data["IsSuccess"], "true");
        assert!(data["ActionData"].contains("\"text\":\"hello\""));
    }

    #[test]
    fn missing_payload_serializes_as_literal_null() {
        let update = ClientUpdate::failure("", ActionType::ChatCreated, None);
        let data = serialize_update(&update);

        assert_eq!(data["ActionData"], "null");
        assert_eq!(data["IsSuccess"], "false");
    }

    #[test]
    fn text_payload_is_emitted_verbatim() {
        let update = ClientUpdate::failure(
            "id-1",
            ActionType::MessageSent,
            Some(UpdatePayload::Text("Message creation failed".to_string())),
        );
        let data = serialize_update(&update);

        // No JSON quoting around plain text.
        assert_eq!(data["ActionData"], "Message creation failed");
    }

    #[test]
    fn enum_fields_serialize_by_symbolic_name() {
        let update = ClientUpdate::success(
            "x",
            ActionType::UserStatusChanged,
            UpdatePayload::Status(UserStatus {
                user_id: Uuid::nil(),
                status: StatusType::Online,
            }),
        );
        let data = serialize_update(&update);

        assert!(data["ActionData"].contains("\"status\":\"Online\""));
        assert_eq!(data["ActionType"], "UserStatusChanged");
    }

    #[test]
    fn numeric_id_payload_encodes_as_number_text() {
        let update = ClientUpdate::success("x", ActionType::MessageDeleted, UpdatePayload::Id(42));
        let data = serialize_update(&update);
        assert_eq!(data["ActionData"], "42");
    }

    #[test]
    fn unbounded_nesting_is_pruned_not_recursed() {
        // Build a JSON tree far deeper than the encoder's depth bound and
        // check that bounding terminates and keeps the upper levels.
        let mut value = Value::String("leaf".to_string());
        for _ in 0..2_000 {
            value = serde_json::json!({ "next": value });
        }

        let bounded = bound_depth(value, MAX_ENCODE_DEPTH);
        let text = serde_json::to_string(&bounded).unwrap();
        assert!(!text.is_empty());
        assert!(text.starts_with("{\"next\":"));
        assert!(text.contains("null"));
    }

    #[test]
    fn depth_zero_elides_everything() {
        let value = serde_json::json!({ "a": 1 });
        assert_eq!(bound_depth(value, 0), Value::Null);
    }

    #[test]
    fn scalars_survive_bounding() {
        let value = serde_json::json!(true);
        assert_eq!(bound_depth(value, 1), Value::Bool(true));
    }
}
