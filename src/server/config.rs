/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration: the
 * optional PostgreSQL database connection, the push gateway used for client
 * update delivery, and the avatar storage directory.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables, with sensible defaults
 * for local development when possible.
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup.
 * Services that fail to initialize are set to `None` (or a disabled stand-in)
 * and the server continues without them.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::dispatch::{DisabledPushTransport, HttpPushTransport, PushTransport};
use crate::files::AvatarStore;

/// Database configuration result
///
/// Contains the database connection pool if successfully configured,
/// or `None` if the database is not available.
pub type DatabaseConfig = Option<PgPool>;

/// Load and initialize database connection pool
///
/// This function:
/// 1. Reads `DATABASE_URL` from environment
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if database is successfully configured
/// - `None` if `DATABASE_URL` is not set or connection fails
///
/// # Errors
///
/// Errors are logged but do not prevent server startup. The function
/// returns `None` on any error, allowing the server to run without
/// database features.
pub async fn load_database() -> DatabaseConfig {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set. Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    // Run migrations
    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            // Continue anyway - migrations might have already been run
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Load the push transport used to deliver client updates.
///
/// Reads `PUSH_GATEWAY_URL` (required for real delivery) and
/// `PUSH_GATEWAY_KEY` (optional bearer credential). When the URL is not set,
/// a disabled transport is returned: dispatch still resolves recipients and
/// logs, but no network sends happen.
pub fn load_push_transport() -> Arc<dyn PushTransport> {
    match std::env::var("PUSH_GATEWAY_URL") {
        Ok(endpoint) => {
            let api_key = std::env::var("PUSH_GATEWAY_KEY").ok();
            tracing::info!("Push gateway configured at {}", endpoint);
            Arc::new(HttpPushTransport::new(endpoint, api_key))
        }
        Err(_) => {
            tracing::warn!("PUSH_GATEWAY_URL not set. Push delivery will be disabled.");
            Arc::new(DisabledPushTransport)
        }
    }
}

/// Load the avatar storage directory.
///
/// Reads `AVATAR_DIR`, defaulting to `uploads/avatars` relative to the
/// working directory. The directory is created lazily on first save.
pub fn load_avatar_store() -> AvatarStore {
    let root = std::env::var("AVATAR_DIR").unwrap_or_else(|_| "uploads/avatars".to_string());
    tracing::info!("Avatar storage directory: {}", root);
    AvatarStore::new(root)
}
