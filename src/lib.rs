pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod services;
pub mod storage;
pub mod sync;

pub use error::{Result, TellmyError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
