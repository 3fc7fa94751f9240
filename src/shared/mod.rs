//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. These types travel over HTTP as JSON: the
//! data set returned by the read path and the small payloads carried by
//! stream events.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over HTTP.

/// Shared data set records (users, threads, messages)
pub mod model;

/// Stream event types
pub mod event;

/// Shared error types
pub mod error;

/// HTTP request and response bodies
pub mod api;

/// Re-export commonly used types for convenience
pub use model::{ChatThread, DataSet, Message, User};
pub use event::{RevisionEvent, StreamEvent, StreamEventKind, StreamPayload, UpdateSource};
pub use error::SharedError;
