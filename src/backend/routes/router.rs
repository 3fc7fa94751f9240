/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Stream route (`/api/stream`)
 * 2. API routes (state, users, threads, messages, health)
 * 3. Fallback handler (404)
 *
 * Every request passes through the `tower-http` trace layer.
 */
use axum::http::StatusCode;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::subscription::handle_stream_subscription;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// - `GET /api/stream` - Server-Sent Events change stream
/// - `GET /api/state` - Current data set
/// - `GET /api/health` - Revision and marker
/// - `POST /api/users` - Register a user
/// - `POST /api/threads` - Open a thread
/// - `POST /api/threads/{thread_id}/messages` - Post a message
/// - `PATCH /api/messages/{message_id}` - Edit a message
/// - `DELETE /api/messages/{message_id}?actor_id=` - Delete a message
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route(
        "/api/stream",
        axum::routing::get(handle_stream_subscription),
    );

    // Add API routes
    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
