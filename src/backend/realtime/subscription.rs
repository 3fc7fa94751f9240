/**
 * Store Stream Subscription Handler
 *
 * This module implements the Server-Sent Events (SSE) handler for the
 * `/api/stream` endpoint. Each request opens one `StreamConnection` on the
 * notifier and forwards its events to the client unchanged.
 *
 * # Event Format
 *
 * The SSE event name is the stream event kind; the data line is the JSON
 * payload. Events never carry data from the store, clients refetch
 * `GET /api/state` when they see `store-update`.
 *
 * ```http
 * event: ready
 * data: {"revision":3,"at":"2026-10-01T12:00:00Z"}
 *
 * event: store-update
 * data: {"revision":4,"at":"2026-10-01T12:00:01Z","source":"local"}
 *
 * event: ping
 * data: {"revision":4,"at":"2026-10-01T12:00:26Z"}
 * ```
 *
 * # Connection Management
 *
 * Keep-alive comes from the notifier's own `ping` events, so axum's
 * `KeepAlive` is not installed. When the client hangs up axum drops the
 * stream, which closes the connection and ends its session task.
 */
use crate::backend::realtime::notifier::StreamNotifier;
use crate::shared::StreamEvent;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// Handle a store change subscription (GET /api/stream)
///
/// # Returns
///
/// Server-Sent Events stream of `ready`, `store-update` and `ping` events
pub async fn handle_stream_subscription(
    State(notifier): State<StreamNotifier>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let connection = notifier.open();
    tracing::info!(
        "[Realtime] Stream subscription {} active ({} open)",
        connection.id(),
        notifier.active_connections()
    );

    Sse::new(connection.map(|event| Ok(to_sse_event(&event))))
}

/// Convert a stream event into its SSE wire form
pub fn to_sse_event(event: &StreamEvent) -> Event {
    let data = match event.data() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("[Realtime] Failed to serialize {} event: {:?}", event.name(), e);
            "{}".to_string()
        }
    };
    Event::default().event(event.name()).data(data)
}
