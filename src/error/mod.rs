//! Server Error Module
//!
//! Error types used by HTTP handlers, convertible to JSON error responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # HTTP Response Conversion
//!
//! `ApiError` implements `IntoResponse` from Axum, so handlers can return
//! `Result<_, ApiError>` directly. The error is converted to the matching
//! HTTP status code and a JSON body of the form
//! `{"error": "...", "status": 400}`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::ApiError;
