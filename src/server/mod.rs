//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Configuration loading (database, push gateway, avatars)
//! └── init.rs   - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: database pool, push transport, avatar store
//! 2. **Dispatcher Wiring**: update dispatcher built when a database exists
//! 3. **State Creation**: everything bundled into `AppState`
//! 4. **Router Creation**: routes and middleware assembled
//!
//! All services are optional: the server starts without a database or push
//! gateway and degrades to 503s and disabled dispatch respectively.

/// Application state
pub mod state;

/// Configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use init::create_app;
pub use state::AppState;
