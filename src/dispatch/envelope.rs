/**
 * Client Update Envelope
 *
 * This module defines the `ClientUpdate` envelope that every write handler
 * constructs per affected recipient, together with the closed action taxonomy
 * that discriminates how receivers interpret the payload.
 *
 * # Design
 *
 * The envelope is a plain value: it is built, handed to the dispatcher, and
 * discarded. It is never persisted and never mutated after construction.
 *
 * The action taxonomy (`ActionType`) carries no behavior. It exists purely so
 * that a receiving client can decide how to interpret `action_data`. Adding a
 * new synchronizable event means adding a new label here and a matching
 * payload variant to `UpdatePayload`.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::users::UserInfo;
use crate::chat::db::{Chat, ChatSummary};
use crate::messaging::db::Message;

/// The closed set of synchronizable events.
///
/// Each label names one event that a client may need to react to. The wire
/// value of a label is its symbolic name (see `ActionType::as_str`), never an
/// ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    MessageReceived,
    MessageSent,
    MessageDeleted,
    ChatMessagesUpdated,
    ChatListUpdated,
    ChatUpdated,
    ChatUsersUpdated,
    ChatCreated,
    ChatDeleted,
    UserRegistered,
    UserLoggedIn,
    UserUpdated,
    UserStatusChanged,
}

impl ActionType {
    /// Symbolic name of the label as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageReceived => "MessageReceived",
            Self::MessageSent => "MessageSent",
            Self::MessageDeleted => "MessageDeleted",
            Self::ChatMessagesUpdated => "ChatMessagesUpdated",
            Self::ChatListUpdated => "ChatListUpdated",
            Self::ChatUpdated => "ChatUpdated",
            Self::ChatUsersUpdated => "ChatUsersUpdated",
            Self::ChatCreated => "ChatCreated",
            Self::ChatDeleted => "ChatDeleted",
            Self::UserRegistered => "UserRegistered",
            Self::UserLoggedIn => "UserLoggedIn",
            Self::UserUpdated => "UserUpdated",
            Self::UserStatusChanged => "UserStatusChanged",
        }
    }
}

/// Presence state announced via `UserStatusChanged` updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusType {
    Online,
    Offline,
}

/// A presence change for a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub user_id: Uuid,
    pub status: StatusType,
}

/// The payload carried by an envelope.
///
/// One variant per payload shape the handlers produce. Keeping this closed
/// lets the wire serializer match exhaustively, so a new payload shape cannot
/// be added without also deciding how it is encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UpdatePayload {
    /// A single message (sent confirmations, received notifications).
    Message(Message),
    /// All messages of a chat.
    Messages(Vec<Message>),
    /// A full chat with its members.
    Chat(Chat),
    /// Chat summaries for a user's chat list.
    ChatList(Vec<ChatSummary>),
    /// Members of a chat.
    Users(Vec<UserInfo>),
    /// A single user's public info.
    User(UserInfo),
    /// A presence change.
    Status(UserStatus),
    /// A bare numeric id (deletions).
    Id(i64),
    /// Free text, typically a human-readable failure description.
    Text(String),
}

/// The update envelope delivered to one recipient.
///
/// Exists only for the duration of one dispatch call; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpdate {
    /// Correlation token of the triggering request. Empty when the caller
    /// supplied no `ActionIdentifier` header.
    pub action_id: String,
    /// Which synchronizable event this update describes.
    pub action_type: ActionType,
    /// Whether the triggering operation succeeded.
    pub is_success: bool,
    /// Payload, `None` on failure or when no payload is meaningful.
    pub action_data: Option<UpdatePayload>,
}

impl ClientUpdate {
    /// Build a successful update carrying a payload.
    pub fn success(action_id: impl Into<String>, action_type: ActionType, data: UpdatePayload) -> Self {
        Self {
            action_id: action_id.into(),
            action_type,
            is_success: true,
            action_data: Some(data),
        }
    }

    /// Build a failed update. `data` is usually `None` or a short
    /// `UpdatePayload::Text` describing what went wrong.
    pub fn failure(
        action_id: impl Into<String>,
        action_type: ActionType,
        data: Option<UpdatePayload>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            action_type,
            is_success: false,
            action_data: data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_names_are_symbolic() {
        assert_eq!(ActionType::MessageReceived.as_str(), "MessageReceived");
        assert_eq!(ActionType::UserStatusChanged.as_str(), "UserStatusChanged");
    }

    #[test]
    fn success_constructor_sets_flag() {
        let update = ClientUpdate::success("abc", ActionType::ChatDeleted, UpdatePayload::Id(7));
        assert!(update.is_success);
        assert_eq!(update.action_id, "abc");
        assert_eq!(update.action_data, Some(UpdatePayload::Id(7)));
    }

    #[test]
    fn failure_constructor_clears_flag() {
        let update = ClientUpdate::failure("", ActionType::MessageSent, None);
        assert!(!update.is_success);
        assert!(update.action_data.is_none());
    }
}
