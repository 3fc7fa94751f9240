//! Real-time Update Module
//!
//! This module tells connected clients that the shared data set changed.
//! It never ships data, only "something changed, refetch".
//!
//! # Architecture
//!
//! - **`publisher`** - In-process revision counter and listener registry
//! - **`beacon`** - Durable cross-instance change marker and its poller
//! - **`notifier`** - Per-connection session: ready, updates, pings
//! - **`policy`** - Best-effort handling for emits and polls
//! - **`subscription`** - Server-Sent Events handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── publisher.rs    - RevisionPublisher, Subscription
//! ├── beacon.rs       - ChangeBeacon, BeaconPoller
//! ├── notifier.rs     - StreamNotifier, StreamConnection
//! ├── policy.rs       - TransportFailure, best_effort
//! └── subscription.rs - SSE subscription handler
//! ```
//!
//! # Two Signal Paths
//!
//! A commit in this process reaches local streams through the publisher
//! immediately (`source: "local"`). A commit in another process reaches
//! them through the beacon within one poll interval (`source: "marker-poll"`).
//! A local commit also moves the marker, so a client may see both; both
//! mean "refetch".

/// Revision publisher
pub mod publisher;

/// Cross-instance change beacon
pub mod beacon;

/// Stream notifier and connection lifecycle
pub mod notifier;

/// Best-effort policy for stream operations
pub mod policy;

/// Server-Sent Events subscription handler
pub mod subscription;

// Re-export commonly used types and functions
pub use beacon::{BeaconPoller, ChangeBeacon};
pub use notifier::{
    ConnectionHandle, ConnectionState, NotifierConfig, StreamConnection, StreamNotifier,
};
pub use policy::{best_effort, TransportFailure};
pub use publisher::{RevisionPublisher, Subscription};
pub use subscription::handle_stream_subscription;
