//! Authentication and User Management
//!
//! This module covers account storage, password-backed login, and JWT
//! session tokens:
//!
//! - **`users`** - user model and database operations
//! - **`sessions`** - JWT creation and verification
//! - **`handlers`** - HTTP handlers for register/login/me

/// User model and database operations
pub mod users;

/// JWT session tokens
pub mod sessions;

/// HTTP handlers
pub mod handlers;

pub use handlers::{check_auth, get_me, login, register};
pub use users::{User, UserInfo};
