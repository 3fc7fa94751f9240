//! Common test utilities and helpers
//!
//! - `TestApp`: router + state over an in-memory store, driven with
//!   `tower::ServiceExt::oneshot`
//! - Fixture helpers that go through the real HTTP routes
//! - Fixed-id data sets for comparing final states

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use msgrelay::backend::realtime::NotifierConfig;
use msgrelay::backend::routes::create_router;
use msgrelay::backend::server::AppState;
use msgrelay::backend::store::{MemoryStore, Store};
use msgrelay::backend::StreamNotifier;
use msgrelay::shared::{ChatThread, DataSet, Message, User};

pub const TEST_HEARTBEAT: Duration = Duration::from_secs(10);
pub const TEST_POLL: Duration = Duration::from_secs(1);

pub fn test_notifier_config() -> NotifierConfig {
    NotifierConfig {
        heartbeat_interval: TEST_HEARTBEAT,
        poll_interval: TEST_POLL,
        event_buffer: 64,
    }
}

/// One simulated server process over a shared backend
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: MemoryStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_backend(MemoryStore::new())
    }

    /// A process whose durable record is shared with every other clone of `backend`
    pub fn with_backend(backend: MemoryStore) -> Self {
        let store = Store::new(Arc::new(backend.clone()));
        let notifier = StreamNotifier::for_store(&store, test_notifier_config());
        let state = AppState::new(store, notifier);
        let router = create_router(state.clone());
        Self {
            router,
            state,
            backend,
        }
    }

    pub fn store(&self) -> &Store {
        &self.state.store
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn create_user(&self, username: &str) -> User {
        let response = self
            .request(Method::POST, "/api/users", Some(json!({ "username": username })))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    pub async fn create_thread(&self, creator: &User, others: &[&User]) -> ChatThread {
        let participants: Vec<Uuid> = others.iter().map(|u| u.id).collect();
        let response = self
            .request(
                Method::POST,
                "/api/threads",
                Some(json!({ "created_by": creator.id, "participants": participants })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    pub async fn send_message(&self, thread: &ChatThread, sender: &User, body: &str) -> Message {
        let response = self
            .request(
                Method::POST,
                &format!("/api/threads/{}/messages", thread.id),
                Some(json!({ "sender_id": sender.id, "body": body })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Data set with fixed ids and timestamps: two users and one thread
pub fn seeded_data_set() -> (DataSet, Uuid) {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let alice = User {
        id: Uuid::from_u128(1),
        username: "alice".to_string(),
        display_name: "Alice".to_string(),
        created_at: at,
    };
    let bob = User {
        id: Uuid::from_u128(2),
        username: "bob".to_string(),
        display_name: "Bob".to_string(),
        created_at: at,
    };
    let thread = ChatThread {
        id: Uuid::from_u128(10),
        title: Some("plans".to_string()),
        participants: vec![alice.id, bob.id],
        created_by: alice.id,
        created_at: at,
        updated_at: at,
        last_message_at: None,
    };

    let mut data = DataSet::new();
    data.users.insert(alice.id, alice);
    data.users.insert(bob.id, bob);
    let thread_id = thread.id;
    data.threads.insert(thread.id, thread);
    (data, thread_id)
}
