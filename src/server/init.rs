/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server:
 * loading optional services, wiring the update dispatcher, and building the
 * router.
 *
 * # Initialization Process
 *
 * 1. Load optional services (database, push transport, avatar storage)
 * 2. Build the update dispatcher when a database is available
 * 3. Create the application state
 * 4. Create and configure the router
 *
 * # Error Handling
 *
 * Initialization is resilient: a missing database disables data endpoints
 * (they answer 503) and update dispatch, a missing push gateway disables
 * only the network sends. The server starts either way.
 */

use std::sync::Arc;

use axum::Router;

use crate::dispatch::{PgDeviceTokenStore, UpdateDispatcher};
use crate::routes::create_router;
use crate::server::config::{load_avatar_store, load_database, load_push_transport};
use crate::server::state::AppState;

/// Create and configure the Axum application
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing messenger backend server");

    // Step 1: Load optional services
    let db_pool = load_database().await;
    let transport = load_push_transport();
    let avatars = load_avatar_store();

    // Step 2: Build the dispatcher. Recipient resolution reads the users
    // table, so dispatch only exists when the database does.
    let dispatcher = db_pool.clone().map(|pool| {
        Arc::new(UpdateDispatcher::new(
            Arc::new(PgDeviceTokenStore::new(pool)),
            transport,
        ))
    });
    if dispatcher.is_none() {
        tracing::warn!("Update dispatch disabled (no database)");
    }

    // Step 3: Create app state
    let app_state = AppState {
        db_pool,
        dispatcher,
        avatars,
    };

    // Step 4: Create router with all routes
    create_router(app_state)
}
