//! Messaging HTTP Handlers
//!
//! Every write handler runs one transform from `operations` through
//! `Store::update` and returns the affected record. Validation failures
//! and persistence failures become `BackendError` responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::operations;
use crate::backend::error::BackendError;
use crate::backend::realtime::beacon::ChangeBeacon;
use crate::backend::realtime::policy::best_effort;
use crate::backend::store::{Store, StoreBackend};
use crate::shared::api::{
    CreateThreadRequest, CreateUserRequest, DeleteMessageQuery, EditMessageRequest,
    HealthResponse, SendMessageRequest, REVISION_HEADER,
};
use crate::shared::{ChatThread, Message, User};

/// Current data set (GET /api/state)
///
/// The `x-store-revision` header carries the local revision observed
/// before the read, so the body is at least that fresh.
pub async fn get_state(State(store): State<Store>) -> Result<Response, BackendError> {
    let revision = store.current_revision();
    let data = store.read().await?;
    Ok(([(REVISION_HEADER, revision.to_string())], Json(data)).into_response())
}

/// Register a user (POST /api/users)
pub async fn create_user(
    State(store): State<Store>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), BackendError> {
    let user = store
        .update(move |data| operations::create_user(data, request))
        .await?;
    tracing::info!("[Server] Created user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Open a thread (POST /api/threads)
pub async fn create_thread(
    State(store): State<Store>,
    Json(request): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ChatThread>), BackendError> {
    let thread = store
        .update(move |data| operations::create_thread(data, request))
        .await?;
    tracing::info!(
        "[Server] Created thread {} with {} participants",
        thread.id,
        thread.participants.len()
    );
    Ok((StatusCode::CREATED, Json(thread)))
}

/// Post a message (POST /api/threads/{thread_id}/messages)
pub async fn send_message(
    State(store): State<Store>,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), BackendError> {
    let message = store
        .update(move |data| operations::send_message(data, thread_id, request))
        .await?;
    tracing::debug!("[Server] Message {} sent to thread {}", message.id, thread_id);
    Ok((StatusCode::CREATED, Json(message)))
}

/// Edit a message (PATCH /api/messages/{message_id})
pub async fn edit_message(
    State(store): State<Store>,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<Message>, BackendError> {
    let message = store
        .update(move |data| operations::edit_message(data, message_id, request))
        .await?;
    Ok(Json(message))
}

/// Soft-delete a message (DELETE /api/messages/{message_id}?actor_id=)
pub async fn delete_message(
    State(store): State<Store>,
    Path(message_id): Path<Uuid>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<Json<Message>, BackendError> {
    let actor_id = query
        .actor_id
        .ok_or_else(|| BackendError::handler(StatusCode::BAD_REQUEST, "actor_id is required"))?;
    let message = store
        .update(move |data| operations::delete_message(data, message_id, actor_id))
        .await?;
    tracing::debug!("[Server] Message {} deleted by {}", message_id, actor_id);
    Ok(Json(message))
}

/// Liveness and revision info (GET /api/health)
pub async fn health(State(store): State<Store>) -> Json<HealthResponse> {
    let backend = store.backend();
    let marker = best_effort("health marker read", backend.current_marker().await);
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: backend.name().to_string(),
        revision: store.current_revision(),
        marker,
    })
}
