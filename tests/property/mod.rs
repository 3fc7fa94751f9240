//! Property-based tests

mod serializer_proptest;
