//! Authentication Handlers
//!
//! HTTP handlers for registration, login, and current-user queries.

/// Registration handler
pub mod register;

/// Login handler
pub mod login;

/// Current-user handlers
pub mod me;

/// Request/response types
pub mod types;

pub use login::login;
pub use me::{check_auth, get_me};
pub use register::register;
