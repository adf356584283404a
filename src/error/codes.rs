//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Story errors
//! - 3xx: Config errors
//! - 5xx: Network errors
//! - 6xx: Storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `StoryNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Story errors (1xx)
    // ========================================
    /// E101: Story is neither reachable remotely nor cached locally
    StoryNotFound,
    /// E102: The remote API rejected the request
    ApiRejected,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E501: Cannot reach remote server
    NetworkUnreachable,
    /// E502: Remote server answered with a non-success status
    NetworkHttpStatus,
    /// E503: Authentication with remote failed
    NetworkAuthFailed,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Local store could not be opened or used
    StorageUnavailable,
    /// E604: Database operation failed
    DatabaseError,
    /// E605: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Caller supplied an invalid record
    ValidationFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E905: Generic not found (catch-all)
    NotFound,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `StoryNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::StoryNotFound => 101,
            Self::ApiRejected => 102,

            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::NetworkUnreachable => 501,
            Self::NetworkHttpStatus => 502,
            Self::NetworkAuthFailed => 503,

            Self::StorageUnavailable => 601,
            Self::DatabaseError => 604,
            Self::SerializationError => 605,

            Self::ValidationFailed => 801,

            Self::NotFound => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::StoryNotFound => "Open the story once while online so it is cached, then retry offline",
            Self::ApiRejected => "Check the request fields; the server message explains what was rejected",

            Self::ConfigInvalid => "Check TOML syntax in the config file, or the TELLMY_* environment overrides",
            Self::ConfigMissingRequired => "Set the required value in config.toml or via its TELLMY_* environment variable",

            Self::NetworkUnreachable => "Check your connection. Mutations made while offline are queued; run `tellmy queue sync` later",
            Self::NetworkHttpStatus => "The server answered with an error status. Retry later with `tellmy queue sync`",
            Self::NetworkAuthFailed => "Log in again with `tellmy login`",

            Self::StorageUnavailable => "Check that the database path is writable, or set TELLMY_DB_PATH",
            Self::DatabaseError => "The local database may be damaged. `tellmy reset` wipes it",
            Self::SerializationError => "A stored record could not be decoded. `tellmy reset` wipes local data",

            Self::ValidationFailed => "Every story needs a non-empty id",

            Self::NotFound => "The requested resource was not found. Check the identifier",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::StoryNotFound
            | Self::ApiRejected
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::NetworkUnreachable
            | Self::NetworkHttpStatus
            | Self::NetworkAuthFailed
            | Self::StorageUnavailable
            | Self::ValidationFailed
            | Self::NotFound
            | Self::IoError => true,

            Self::DatabaseError | Self::SerializationError => false,
        }
    }

    /// Whether the failure is transient: the same request may succeed later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkUnreachable | Self::NetworkHttpStatus)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "story",
            3 => "config",
            5 => "network",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::StoryNotFound,
            Self::ApiRejected,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::NetworkUnreachable,
            Self::NetworkHttpStatus,
            Self::NetworkAuthFailed,
            Self::StorageUnavailable,
            Self::DatabaseError,
            Self::SerializationError,
            Self::ValidationFailed,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
