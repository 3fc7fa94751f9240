/**
 * Stream Event Types
 *
 * This module defines the events that travel over a client's stream
 * connection and the revision event the publisher hands to listeners.
 *
 * Stream events never carry the changed data. They only tell the client
 * that a change happened; the client refetches through the read path.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event handed to publisher listeners on every committed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionEvent {
    /// Process-local revision after the commit
    pub revision: u64,
    /// Durable marker written by the commit
    pub marker: u64,
    /// When the commit was published
    pub at: DateTime<Utc>,
}

impl RevisionEvent {
    /// Create a revision event stamped with the current time
    pub fn now(revision: u64, marker: u64) -> Self {
        Self {
            revision,
            marker,
            at: Utc::now(),
        }
    }
}

/// Where a `store-update` originated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateSource {
    /// A mutation committed by this process
    Local,
    /// A beacon marker change, usually committed by another process
    MarkerPoll,
}

/// Name of a stream event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StreamEventKind {
    /// First event on every connection
    Ready,
    /// Keep-alive
    Ping,
    /// Something changed; refetch
    StoreUpdate,
}

impl StreamEventKind {
    /// Event name as written on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Ping => "ping",
            Self::StoreUpdate => "store-update",
        }
    }
}

/// JSON body of a stream event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamPayload {
    /// Local revision of the emitting process
    pub revision: u64,
    /// When the event was produced
    pub at: DateTime<Utc>,
    /// Origin of a `store-update`; absent for `ready` and `ping`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<UpdateSource>,
}

/// A named event sent to one stream connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub kind: StreamEventKind,
    pub payload: StreamPayload,
}

impl StreamEvent {
    /// Create a `ready` event
    pub fn ready(revision: u64) -> Self {
        Self::new(StreamEventKind::Ready, revision, None)
    }

    /// Create a `ping` event
    pub fn ping(revision: u64) -> Self {
        Self::new(StreamEventKind::Ping, revision, None)
    }

    /// Create a `store-update` event tagged with its origin
    pub fn store_update(revision: u64, source: UpdateSource) -> Self {
        Self::new(StreamEventKind::StoreUpdate, revision, Some(source))
    }

    /// Create a `store-update` for a local revision event
    pub fn from_revision(event: &RevisionEvent) -> Self {
        Self {
            kind: StreamEventKind::StoreUpdate,
            payload: StreamPayload {
                revision: event.revision,
                at: event.at,
                source: Some(UpdateSource::Local),
            },
        }
    }

    fn new(kind: StreamEventKind, revision: u64, source: Option<UpdateSource>) -> Self {
        Self {
            kind,
            payload: StreamPayload {
                revision,
                at: Utc::now(),
                source,
            },
        }
    }

    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Serialize the payload to JSON
    pub fn data(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
