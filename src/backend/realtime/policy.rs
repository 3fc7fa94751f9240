//! Best-effort policy for stream operations
//!
//! Heartbeats, beacon polls and event emits are allowed to fail. A failure
//! turns into "nothing this cycle": it is logged and never escalated, so a
//! disconnect race or a storage hiccup cannot tear down the publish loop or
//! the rest of the connection.

use std::fmt::Display;
use thiserror::Error;

/// Failure to hand an event to a stream connection
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The client went away or the connection was closed
    #[error("stream connection closed")]
    Closed,
    /// The client is not draining events fast enough
    #[error("stream buffer full, event dropped")]
    Backpressure,
}

/// Swallow the error of a best-effort operation
///
/// Returns the value on success, `None` on failure. Failures are logged at
/// debug level: they are expected (clients disconnect mid-emit, storage
/// blips between polls) and retried on the next cycle.
pub fn best_effort<T, E: Display>(operation: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("[Realtime] {} skipped this cycle: {}", operation, e);
            None
        }
    }
}
