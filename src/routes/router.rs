/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * Routes are added in a specific order to ensure proper matching:
 * 1. Public API routes (register, login)
 * 2. Protected API routes (everything behind the auth middleware)
 * 3. Static avatar files
 * 4. Fallback handler (404)
 *
 * # Middleware
 *
 * The correlation middleware wraps the whole router, so every request -
 * public, protected, or 404 - carries an `ActionId` extension by the time
 * any extractor runs.
 */

use axum::{middleware::from_fn, Router};
use tower_http::services::ServeDir;

use crate::files::AVATAR_URL_PREFIX;
use crate::middleware::correlation::correlation_middleware;
use crate::routes::api_routes::{protected_routes, public_routes};
use crate::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the database pool, the
///   update dispatcher, and the avatar store
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(app_state.clone()));

    // Serve uploaded avatars back as static content
    let router = router.nest_service(
        AVATAR_URL_PREFIX,
        ServeDir::new(app_state.avatars.root()),
    );

    // Fallback handler for 404
    let router = router.fallback(|| async { "404 Not Found" });

    // Correlation runs outermost so the ActionId extension exists everywhere
    let router = router.layer(from_fn(correlation_middleware));

    // Use AppState as router state
    router.with_state(app_state)
}
