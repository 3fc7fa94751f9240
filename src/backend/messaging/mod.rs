//! Messaging Module
//!
//! Users, threads and messages on top of the shared data set. These are
//! the collaborators of the store: they only ever write through
//! `Store::update`.
//!
//! - **`operations`** - Pure data set transforms with validation
//! - **`handlers`** - Axum handlers for the `/api` routes

/// Data set transforms
pub mod operations;

/// HTTP handlers
pub mod handlers;
