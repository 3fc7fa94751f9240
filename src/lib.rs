// Increase recursion limit for deeply nested async state machines
#![recursion_limit = "256"]

//! msgrelay - Messenger Backend Library
//!
//! msgrelay is a messenger backend built with Rust. Many HTTP handlers
//! mutate one shared data set (users, chat threads, messages) while
//! connected clients are told, in near-real time, that something changed
//! and they should refetch.
//!
//! # Overview
//!
//! The heart of the library is a concurrency and synchronization engine:
//!
//! - A transactional mutation primitive (`Store::mutate`) that serializes
//!   every read-modify-write of the shared data set within a process and
//!   persists the result before the caller observes success
//! - A revision publisher that fans each committed mutation out to local
//!   listeners
//! - A durable change beacon that lets other server processes detect that
//!   *some* instance committed a change
//! - A streaming notifier that keeps one Server-Sent Events channel per
//!   client alive and relays `ready`, `ping` and `store-update` events
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and clients
//!   - Data set records (users, threads, messages)
//!   - Stream event payloads
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Durable store backends and the mutation serializer
//!   - Revision publisher, change beacon and streaming notifier
//!   - Axum router, collaborator handlers and configuration
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enabled by default)
//!   - Includes the Axum server, SSE transport and binary entry point
//!
//! # Usage
//!
//! ```rust,no_run
//! use msgrelay::backend::store::{MemoryStore, Store};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), msgrelay::backend::store::MutationError> {
//! let store = Store::new(Arc::new(MemoryStore::new()));
//! let user_count = store
//!     .update(|data| Ok(data.users.len()))
//!     .await?;
//! # let _ = user_count;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - The shared data set is only mutated inside the serializer's critical
//!   section (`tokio::sync::Mutex`, FIFO fair)
//! - The subscription registry is snapshotted per publish pass, so listeners
//!   may subscribe or unsubscribe from inside their own callbacks
//! - Every stream connection owns its timers and subscription and releases
//!   them when the client disconnects

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
