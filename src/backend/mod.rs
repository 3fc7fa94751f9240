//! Backend Module
//!
//! This module contains all server-side code: the shared data set store,
//! the real-time change notification system and the Axum HTTP server in
//! front of them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`store`** - Durable backends and the mutation serializer
//! - **`realtime`** - Revision publisher, change beacon, stream notifier
//! - **`messaging`** - Users, threads and messages as store transforms
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`error`** - HTTP-facing error type
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── store/          - StoreBackend, Store, memory/file/postgres backends
//! ├── realtime/       - Publisher, beacon, notifier, SSE handler
//! ├── messaging/      - Transforms and handlers
//! ├── server/         - Config, state, init
//! ├── routes/         - Route configuration
//! └── error/          - BackendError
//! ```
//!
//! # Data Flow
//!
//! ```text
//! POST /api/...  -> Store::update -> save (+marker) -> RevisionPublisher
//!                                                        |
//! GET /api/stream <- StreamNotifier <- local listener ---+
//!                          ^
//!                          +-- ChangeBeacon poll (other processes)
//! ```
//!
//! # Thread Safety
//!
//! - One `tokio::sync::Mutex` serializes every mutation in the process
//! - The publisher registry is a `std::sync::Mutex` held only to snapshot
//! - Each stream connection owns its own session task and timers

/// Shared data set storage
pub mod store;

/// Real-time update system
pub mod realtime;

/// Messaging handlers and transforms
pub mod messaging;

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use error::BackendError;
pub use realtime::{RevisionPublisher, StreamNotifier};
pub use server::{create_app, AppState, ServerConfig};
pub use store::{MutationError, Store, StoreBackend, ValidationFailure};
