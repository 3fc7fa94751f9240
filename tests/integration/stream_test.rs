//! Change stream tests: SSE wire format, local and cross-process updates,
//! heartbeats and teardown

use axum::body::Bytes;
use axum::http::{header, Method, StatusCode};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::{TestApp, TEST_HEARTBEAT, TEST_POLL};
use msgrelay::backend::store::MemoryStore;
use msgrelay::shared::{StreamEventKind, UpdateSource};

type FrameStream = Pin<Box<dyn Stream<Item = Result<Bytes, axum::Error>> + Send>>;

async fn open_sse(app: &TestApp) -> FrameStream {
    let response = app.request(Method::GET, "/api/stream", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));
    Box::pin(response.into_body().into_data_stream())
}

async fn next_frame(stream: &mut FrameStream) -> Option<String> {
    let chunk = tokio::time::timeout(TEST_HEARTBEAT * 3, stream.next())
        .await
        .expect("stream stalled")?;
    Some(String::from_utf8(chunk.unwrap().to_vec()).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_sse_stream_opens_with_ready() {
    let app = TestApp::new();
    let mut stream = open_sse(&app).await;

    let frame = next_frame(&mut stream).await.unwrap();
    assert!(frame.contains("event: ready"), "unexpected frame: {}", frame);
    assert!(frame.contains("\"revision\":0"));
    assert!(!frame.contains("source"));
}

#[tokio::test(start_paused = true)]
async fn test_sse_local_commit_is_announced() {
    let app = TestApp::new();
    let mut stream = open_sse(&app).await;
    next_frame(&mut stream).await.unwrap();

    app.create_user("alice").await;

    let frame = next_frame(&mut stream).await.unwrap();
    assert!(frame.contains("event: store-update"), "unexpected frame: {}", frame);
    assert!(frame.contains("\"source\":\"local\""));
    assert!(frame.contains("\"revision\":1"));
}

#[tokio::test(start_paused = true)]
async fn test_idle_stream_only_pings() {
    let app = TestApp::new();
    let mut connection = app.state.notifier.open();
    assert_eq!(connection.recv().await.unwrap().kind, StreamEventKind::Ready);

    let started = Instant::now();
    for n in 1..=4u32 {
        let event = connection.recv().await.unwrap();
        assert_eq!(event.kind, StreamEventKind::Ping);
        assert_eq!(Instant::now() - started, TEST_HEARTBEAT * n);
    }
}

#[tokio::test(start_paused = true)]
async fn test_other_process_commit_arrives_by_marker_poll() {
    let backend = MemoryStore::new();
    let writer = TestApp::with_backend(backend.clone());
    let watcher = TestApp::with_backend(backend);

    let mut connection = watcher.state.notifier.open();
    assert_eq!(connection.recv().await.unwrap().kind, StreamEventKind::Ready);
    tokio::time::sleep(TEST_POLL / 2).await;

    let opened = Instant::now();
    writer.create_user("alice").await;

    let event = connection.recv().await.unwrap();
    assert_eq!(event.kind, StreamEventKind::StoreUpdate);
    assert_eq!(event.payload.source, Some(UpdateSource::MarkerPoll));
    assert_eq!(event.payload.revision, 0);
    assert!(Instant::now() - opened <= TEST_POLL);

    assert_eq!(writer.store().current_revision(), 1);
    assert_eq!(watcher.store().current_revision(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_client_disconnect_releases_session() {
    let app = TestApp::new();
    let mut stream = open_sse(&app).await;
    next_frame(&mut stream).await.unwrap();
    assert_eq!(app.state.notifier.active_connections(), 1);
    assert_eq!(app.store().publisher().subscriber_count(), 1);

    drop(stream);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(app.state.notifier.active_connections(), 0);
    assert_eq!(app.store().publisher().subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_open_streams() {
    let app = TestApp::new();
    let mut stream = open_sse(&app).await;
    next_frame(&mut stream).await.unwrap();

    app.state.notifier.shutdown();
    assert!(next_frame(&mut stream).await.is_none());
    assert_eq!(app.state.notifier.active_connections(), 0);
}
