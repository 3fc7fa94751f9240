//! Store Module
//!
//! This module owns the shared data set: where it is persisted and how it
//! is mutated.
//!
//! # Architecture
//!
//! - **`backend`** - `StoreBackend` trait and the persisted record layout
//! - **`memory`** - In-process backend (tests, embedded use)
//! - **`file`** - JSON document backend with atomic replace
//! - **`postgres`** - Single-row JSONB backend (sqlx)
//! - **`mutation`** - `Store`, the mutation serializer every write goes through
//! - **`error`** - Validation vs persistence error taxonomy
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs       - Module exports and documentation
//! ├── backend.rs   - StoreBackend trait, PersistedRecord
//! ├── memory.rs    - MemoryStore
//! ├── file.rs      - JsonFileStore
//! ├── postgres.rs  - PgStore
//! ├── mutation.rs  - Store (mutate / update / read)
//! └── error.rs     - StoreError, ValidationFailure, PersistenceFailure, MutationError
//! ```
//!
//! # Write Path
//!
//! ```text
//! handler -> Store::update -> lock -> load -> transform -> save (+marker) -> publish
//! ```
//!
//! The data set and the change beacon marker are stored in the same durable
//! record, so a commit and its beacon advance are one write.

/// Store backend trait and persisted record
pub mod backend;

/// In-memory backend
pub mod memory;

/// JSON file backend
pub mod file;

/// PostgreSQL backend
pub mod postgres;

/// Mutation serializer
pub mod mutation;

/// Store error types
pub mod error;

// Re-export commonly used types
pub use backend::{PersistedRecord, StoreBackend};
pub use error::{MutationError, PersistenceFailure, StoreError, ValidationFailure};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use mutation::Store;
pub use postgres::PgStore;
