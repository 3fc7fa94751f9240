//! Router tests for the /api read and write routes

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::{body_json, TestApp};
use msgrelay::shared::api::{HealthResponse, REVISION_HEADER};
use msgrelay::shared::{DataSet, Message};

fn revision_header(response: &axum::http::Response<axum::body::Body>) -> u64 {
    response
        .headers()
        .get(REVISION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap()
}

#[tokio::test]
async fn test_state_starts_empty() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/api/state", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(revision_header(&response), 0);

    let data: DataSet = body_json(response).await;
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_conversation_flow() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let thread = app.create_thread(&alice, &[&bob]).await;
    let first = app.send_message(&thread, &bob, "hey").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/messages/{}", first.id),
            Some(json!({ "actor_id": bob.id, "body": "hey there" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let edited: Message = body_json(response).await;
    assert_eq!(edited.body, "hey there");

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/messages/{}?actor_id={}", first.id, bob.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/state", None).await;
    assert_eq!(revision_header(&response), 6);
    let data: DataSet = body_json(response).await;
    assert_eq!(data.users.len(), 2);
    assert!(data.threads[&thread.id].has_participant(bob.id));
    assert!(data.messages[&first.id].deleted);
    assert_eq!(app.backend.snapshot().marker, 6);
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let app = TestApp::new();
    app.create_user("alice").await;

    let response = app
        .request(Method::POST, "/api/users", Some(json!({ "username": "Alice" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = body_json(response).await;
    assert_eq!(body["status"], 409);
    assert_eq!(app.store().current_revision(), 1);
}

#[tokio::test]
async fn test_blank_username_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .request(Method::POST, "/api/users", Some(json!({ "username": "  " })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store().current_revision(), 0);
}

#[tokio::test]
async fn test_outsider_cannot_post() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;
    let thread = app.create_thread(&alice, &[&bob]).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/threads/{}/messages", thread.id),
            Some(json!({ "sender_id": carol.id, "body": "hi" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_thread_is_not_found() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/threads/{}/messages", Uuid::new_v4()),
            Some(json!({ "sender_id": alice.id, "body": "anyone?" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_editing_deleted_message_is_conflict() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let thread = app.create_thread(&alice, &[&bob]).await;
    let message = app.send_message(&thread, &alice, "oops").await;

    app.request(
        Method::DELETE,
        &format!("/api/messages/{}?actor_id={}", message.id, alice.id),
        None,
    )
    .await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/messages/{}", message.id),
            Some(json!({ "actor_id": alice.id, "body": "fixed" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_requires_actor() {
    let app = TestApp::new();
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/messages/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(response).await;
    assert_eq!(body["error"], "actor_id is required");
}

#[tokio::test]
async fn test_storage_outage_is_service_unavailable() {
    let app = TestApp::new();
    app.backend.set_unavailable(true);

    let response = app
        .request(Method::POST, "/api/users", Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.request(Method::GET, "/api/state", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.store().current_revision(), 0);

    app.backend.set_unavailable(false);
    app.create_user("alice").await;
    assert_eq!(app.store().current_revision(), 1);
}

#[tokio::test]
async fn test_health_reports_revision_and_marker() {
    let app = TestApp::new();
    app.create_user("alice").await;

    let response = app.request(Method::GET, "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.backend, "memory");
    assert_eq!(health.revision, 1);
    assert_eq!(health.marker, Some(1));

    app.backend.set_unavailable(true);
    let health: HealthResponse = body_json(app.request(Method::GET, "/api/health", None).await).await;
    assert_eq!(health.marker, None);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/api/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
