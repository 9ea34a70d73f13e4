//! Client Device State
//!
//! Endpoints for state a client device reports about itself: the push
//! device token and the user's avatar image.

/// HTTP handlers
pub mod handlers;

pub use handlers::{refresh_device_token, upload_avatar};
