//! HTTP Request and Response Types
//!
//! Bodies accepted and returned by the `/api` routes. Every write request
//! names the acting user explicitly; there is no session layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response header carrying the local revision a `GET /api/state` was served at
pub const REVISION_HEADER: &str = "x-store-revision";

/// `POST /api/users`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub username: String,
    /// Defaults to the username
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `POST /api/threads`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateThreadRequest {
    pub created_by: Uuid,
    /// Other participants; the creator is added automatically
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
}

/// `POST /api/threads/{thread_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub sender_id: Uuid,
    pub body: String,
}

/// `PATCH /api/messages/{message_id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditMessageRequest {
    pub actor_id: Uuid,
    pub body: String,
}

/// Query string of `DELETE /api/messages/{message_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteMessageQuery {
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    /// Commits published by this process
    pub revision: u64,
    /// Durable change marker; `None` if the backend could not be read
    pub marker: Option<u64>,
}
