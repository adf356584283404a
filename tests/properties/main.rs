//! Property-based tests for the local store.

mod queue_tests;
mod retention_tests;
mod story_tests;
