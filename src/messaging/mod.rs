//! Messaging
//!
//! Message persistence and delivery:
//!
//! - **`db`** - message model and database operations
//! - **`handlers`** - HTTP handlers plus the per-recipient fan-out that runs
//!   after a successful send

/// Message model and database operations
pub mod db;

/// HTTP handlers and message fan-out
pub mod handlers;

pub use db::Message;
