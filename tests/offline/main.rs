//! Offline-first flows against an on-disk store and a mock Story API.

mod fixture;
mod flow_tests;
mod migration_tests;
mod sync_tests;
