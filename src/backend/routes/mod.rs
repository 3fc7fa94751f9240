//! Routes Module
//!
//! HTTP route configuration.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Router assembly, stream route, trace layer
//! └── api_routes.rs - /api read and write routes
//! ```

/// Main router creation
pub mod router;

/// API route configuration
pub mod api_routes;

pub use router::create_router;
