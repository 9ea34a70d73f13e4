//! Request Middleware
//!
//! Middleware applied around route handlers:
//!
//! - **`auth`** - JWT bearer verification for protected routes
//! - **`correlation`** - per-request capture of the `ActionIdentifier`
//!   correlation header used by the update dispatch subsystem

/// Authentication middleware and extractor
pub mod auth;

/// Correlation token capture
pub mod correlation;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
pub use correlation::{correlation_middleware, ActionId, ACTION_ID_HEADER};
