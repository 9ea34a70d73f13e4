//! Client Update Dispatch
//!
//! This module is the push-based client synchronization core. Every
//! state-changing operation in the server constructs one `ClientUpdate`
//! envelope per affected recipient and hands it to the `UpdateDispatcher`,
//! which resolves the recipient's device token and delivers the flattened
//! envelope over the push transport.
//!
//! # Module Structure
//!
//! ```text
//! dispatch/
//! ├── mod.rs        - Module exports and documentation
//! ├── envelope.rs   - ClientUpdate envelope and the action taxonomy
//! ├── wire.rs       - Flattening of envelopes into string-to-string data
//! ├── transport.rs  - Push transport seam (HTTP gateway / disabled)
//! └── dispatcher.rs - Token resolution and per-recipient delivery
//! ```
//!
//! # Delivery semantics
//!
//! The channel is best-effort: at most one attempt per recipient, failures
//! logged and swallowed, never surfaced to the HTTP caller. Handlers spawn
//! dispatch calls on detached tasks after the primary write has committed, so
//! push latency cannot block a response and a cancelled request cannot undo a
//! committed write.

/// Envelope value type and action taxonomy
pub mod envelope;

/// Envelope-to-wire serialization
pub mod wire;

/// Push transport implementations
pub mod transport;

/// Per-recipient update delivery
pub mod dispatcher;

// Re-export commonly used types
pub use dispatcher::{
    spawn_send, spawn_send_to_token, DeviceTokenStore, DispatchError, PgDeviceTokenStore,
    UpdateDispatcher,
};
pub use envelope::{ActionType, ClientUpdate, StatusType, UpdatePayload, UserStatus};
pub use transport::{DisabledPushTransport, HttpPushTransport, PushError, PushTransport};
pub use wire::{serialize_update, WireData};
