/**
 * API Route Handlers
 *
 * This module wires the `/api` endpoints to their handlers.
 *
 * # Routes
 *
 * ## Read path
 * - `GET /api/state` - Current data set with `x-store-revision`
 * - `GET /api/health` - Liveness, revision and marker
 *
 * ## Write path (all through `Store::update`)
 * - `POST /api/users`
 * - `POST /api/threads`
 * - `POST /api/threads/{thread_id}/messages`
 * - `PATCH /api/messages/{message_id}`
 * - `DELETE /api/messages/{message_id}`
 */
use axum::routing::{get, patch, post};
use axum::Router;

use crate::backend::messaging::handlers::{
    create_thread, create_user, delete_message, edit_message, get_state, health, send_message,
};
use crate::backend::server::state::AppState;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/state", get(get_state))
        .route("/api/health", get(health))
        .route("/api/users", post(create_user))
        .route("/api/threads", post(create_thread))
        .route("/api/threads/{thread_id}/messages", post(send_message))
        .route(
            "/api/messages/{message_id}",
            patch(edit_message).delete(delete_message),
        )
}
