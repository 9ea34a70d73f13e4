//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Main router creation
//! └── api_routes.rs - API endpoint wiring (public and protected sets)
//! ```
//!
//! # Route Organization
//!
//! Routes are assembled in a specific order:
//!
//! 1. **Public API Routes** - registration and login
//! 2. **Protected API Routes** - everything behind the JWT auth middleware
//! 3. **Static Avatars** - uploaded avatar images served back
//! 4. **Fallback Handler** - 404 for unknown paths
//!
//! The correlation middleware wraps the assembled router so every request
//! carries an `ActionId` extension.

/// Main router creation
pub mod router;

/// API endpoint wiring
pub mod api_routes;

pub use router::create_router;
