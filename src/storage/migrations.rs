//! Database migrations
//!
//! Migrations are additive and forward-only: each one creates the tables and
//! indexes it needs if they are missing and never rewrites existing rows.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, TellmyError};

const MIGRATIONS: [&str; 3] = [
    include_str!("../../migrations/001_initial_schema.sql"),
    include_str!("../../migrations/002_add_offline_queue.sql"),
    include_str!("../../migrations/003_add_cached_category_index.sql"),
];

pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Read the schema version stored in the database header.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|err| TellmyError::StorageUnavailable(format!("read schema version: {err}")))
}

/// Run all migrations on the database
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    run_migrations_to(conn, SCHEMA_VERSION)
}

/// Bring the database up to `target` and return the resulting version.
pub fn run_migrations_to(conn: &Connection, target: u32) -> Result<u32> {
    if target == 0 || target > SCHEMA_VERSION {
        return Err(TellmyError::StorageUnavailable(format!(
            "unknown schema version {target} (supported: 1..={SCHEMA_VERSION})"
        )));
    }

    let current = current_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(TellmyError::StorageUnavailable(format!(
            "database schema v{current} is newer than this build (v{SCHEMA_VERSION})"
        )));
    }
    if current >= target {
        debug!(current, target, "schema already up to date");
        return Ok(current);
    }

    for (idx, sql) in MIGRATIONS.iter().enumerate().take(target as usize) {
        let version = (idx + 1) as u32;
        if current >= version {
            continue;
        }

        conn.execute_batch(sql).map_err(|err| {
            TellmyError::StorageUnavailable(format!("migration {version} failed: {err}"))
        })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|err| {
                TellmyError::StorageUnavailable(format!(
                    "failed to set user_version {version}: {err}"
                ))
            })?;
        info!(from = current, to = version, "upgraded local store schema");
    }

    Ok(target)
}
