//! Integration tests against the public API

mod api_test;
mod postgres_test;
mod scenario_test;
mod stream_test;
