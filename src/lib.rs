//! Messenger - Main Library
//!
//! Messenger is a chat application backend built on Axum and PostgreSQL.
//! Its distinguishing piece is the push-based client synchronization core:
//! every state-changing operation constructs `ClientUpdate` envelopes and
//! fans them out to the affected users' devices through a push gateway,
//! correlated back to the originating request by the client-supplied
//! `ActionIdentifier` header.
//!
//! # Module Structure
//!
//! - **`dispatch`** - client update envelopes, wire serialization, token
//!   resolution, and push delivery
//! - **`auth`** - accounts, password login, JWT sessions
//! - **`chat`** - chat CRUD and membership
//! - **`messaging`** - messages and the per-recipient send fan-out
//! - **`client`** - device token refresh and avatar upload
//! - **`files`** - local-disk avatar storage
//! - **`middleware`** - JWT auth and correlation header capture
//! - **`routes`** - route wiring
//! - **`server`** - state, configuration, initialization
//! - **`error`** - handler error type with JSON responses
//!
//! # Usage
//!
//! ```rust,no_run
//! use messenger::server::create_app;
//!
//! # async fn example() {
//! let app = create_app().await;
//! // Use app with Axum server
//! # }
//! ```
//!
//! # Error Handling
//!
//! Handlers return either bare status codes or `error::ApiError`, which
//! converts to a JSON error body. Dispatch failures never surface to HTTP
//! callers; they are logged by the detached delivery tasks.

/// Client update dispatch core
pub mod dispatch;

/// Accounts, login, JWT sessions
pub mod auth;

/// Chat CRUD and membership
pub mod chat;

/// Messages and send fan-out
pub mod messaging;

/// Client device state (tokens, avatars)
pub mod client;

/// Local-disk file storage
pub mod files;

/// Request middleware
pub mod middleware;

/// Route wiring
pub mod routes;

/// State, configuration, initialization
pub mod server;

/// Handler error type
pub mod error;
