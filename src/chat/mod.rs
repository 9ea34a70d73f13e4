//! Chat Management
//!
//! Chat CRUD and membership:
//!
//! - **`db`** - chat model and database operations
//! - **`handlers`** - HTTP handlers, each dispatching the matching client
//!   updates after the database write

/// Chat model and database operations
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{Chat, ChatSummary};
