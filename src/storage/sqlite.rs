//! SQLite-backed local store
//!
//! Four independent collections (saved stories, cached stories, preferences,
//! offline queue). Every operation is a single statement against one
//! collection; nothing spans collections.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::collection::Collection;
use super::migrations::{self, SCHEMA_VERSION};
use super::records::{
    CachedStory, MutationKind, PreferenceEntry, QueueItem, QueueItemUpdate, SavedStory,
    StorageUsage, Story,
};
use super::retention::RetentionPolicy;
use crate::error::{Result, TellmyError};

/// How a store is brought up.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Schema version to migrate to.
    pub schema_version: u32,
    /// Retention pass run once after opening; `None` skips it.
    pub retention: Option<RetentionPolicy>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            retention: Some(RetentionPolicy::default()),
        }
    }
}

/// Handle to the local database. Construct one with [`LocalStore::open`] and
/// pass it to whoever needs it.
pub struct LocalStore {
    conn: Connection,
    schema_version: u32,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.path)
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open the store at `path` with the current schema and default retention.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    TellmyError::StorageUnavailable(format!(
                        "create database dir {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|err| {
            TellmyError::StorageUnavailable(format!("open {}: {err}", path.display()))
        })?;
        Self::configure_pragmas(&conn)?;
        Self::bootstrap(conn, Some(path.to_path_buf()), options)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(&OpenOptions::default())
    }

    pub fn open_in_memory_with(options: &OpenOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|err| {
            TellmyError::StorageUnavailable(format!("open in-memory database: {err}"))
        })?;
        Self::bootstrap(conn, None, options)
    }

    fn bootstrap(conn: Connection, path: Option<PathBuf>, options: &OpenOptions) -> Result<Self> {
        let schema_version = migrations::run_migrations_to(&conn, options.schema_version)?;
        let store = Self {
            conn,
            schema_version,
            path,
        };
        info!(
            path = ?store.path,
            schema_version = store.schema_version,
            "local store ready"
        );

        if let Some(policy) = &options.retention {
            policy.apply_on_startup(&store);
        }
        Ok(store)
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| TellmyError::Database(err))
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of records held by a collection.
    pub fn count(&self, collection: Collection) -> Result<usize> {
        self.ensure_collection(collection)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // =========================================================================
    // Saved stories (bookmarks)
    // =========================================================================

    pub fn put_saved_story(&self, story: &Story) -> Result<SavedStory> {
        story.validate_key()?;
        let saved_at = now();
        let body = serde_json::to_string(story)?;
        self.conn.execute(
            "INSERT INTO saved_stories (id, body_json, created_at, saved_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                body_json=excluded.body_json,
                created_at=excluded.created_at,
                saved_at=excluded.saved_at",
            params![
                story.id,
                body,
                story.created_at.map(|t| t.to_rfc3339()),
                saved_at.timestamp_millis(),
            ],
        )?;
        debug!(story_id = %story.id, "saved story");
        Ok(SavedStory {
            story: story.clone(),
            saved_at,
        })
    }

    pub fn get_saved_story(&self, id: &str) -> Result<Option<SavedStory>> {
        let row = self
            .conn
            .query_row(
                "SELECT body_json, saved_at FROM saved_stories WHERE id = ?",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        row.map(|(body, saved_at)| {
            Ok(SavedStory {
                story: serde_json::from_str(&body)?,
                saved_at: from_millis(saved_at)?,
            })
        })
        .transpose()
    }

    pub fn get_all_saved_stories(&self) -> Result<Vec<SavedStory>> {
        self.story_rows("SELECT body_json, saved_at FROM saved_stories ORDER BY seq", [])?
            .into_iter()
            .map(|(story, saved_at)| Ok(SavedStory { story, saved_at }))
            .collect()
    }

    pub fn delete_saved_story(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM saved_stories WHERE id = ?", [id])?;
        Ok(())
    }

    pub fn is_saved_story(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM saved_stories WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    // =========================================================================
    // Cached stories
    // =========================================================================

    pub fn put_cached_story(&self, story: &Story) -> Result<CachedStory> {
        self.put_cached_story_at(story, now())
    }

    /// Cache `story` with an explicit cache time.
    pub fn put_cached_story_at(
        &self,
        story: &Story,
        cached_at: DateTime<Utc>,
    ) -> Result<CachedStory> {
        story.validate_key()?;
        let body = serde_json::to_string(story)?;
        self.conn.execute(
            "INSERT INTO cached_stories (id, body_json, cached_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                body_json=excluded.body_json,
                cached_at=excluded.cached_at",
            params![story.id, body, cached_at.timestamp_millis()],
        )?;
        debug!(story_id = %story.id, "cached story");
        Ok(CachedStory {
            story: story.clone(),
            cached_at,
        })
    }

    pub fn get_cached_story(&self, id: &str) -> Result<Option<CachedStory>> {
        let row = self
            .conn
            .query_row(
                "SELECT body_json, cached_at FROM cached_stories WHERE id = ?",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        row.map(|(body, cached_at)| {
            Ok(CachedStory {
                story: serde_json::from_str(&body)?,
                cached_at: from_millis(cached_at)?,
            })
        })
        .transpose()
    }

    pub fn get_all_cached_stories(&self) -> Result<Vec<CachedStory>> {
        self.story_rows(
            "SELECT body_json, cached_at FROM cached_stories ORDER BY seq",
            [],
        )?
        .into_iter()
        .map(|(story, cached_at)| Ok(CachedStory { story, cached_at }))
        .collect()
    }

    /// Cached stories whose body carries `category`, in insertion order (category index).
    pub fn cached_stories_in_category(&self, category: &str) -> Result<Vec<CachedStory>> {
        self.story_rows(
            "SELECT body_json, cached_at FROM cached_stories
             WHERE json_extract(body_json, '$.category') = ? ORDER BY seq",
            [category],
        )?
        .into_iter()
        .map(|(story, cached_at)| Ok(CachedStory { story, cached_at }))
        .collect()
    }

    /// Cached stories strictly older than `cutoff`, oldest first (time index).
    pub fn cached_stories_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<CachedStory>> {
        self.story_rows(
            "SELECT body_json, cached_at FROM cached_stories
             WHERE cached_at < ? ORDER BY cached_at",
            [cutoff.timestamp_millis()],
        )?
        .into_iter()
        .map(|(story, cached_at)| Ok(CachedStory { story, cached_at }))
        .collect()
    }

    pub fn delete_cached_story(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM cached_stories WHERE id = ?", [id])?;
        Ok(())
    }

    /// Delete cached stories older than `max_age`; returns how many went.
    pub fn clear_expired(&self, max_age: Duration) -> Result<usize> {
        self.clear_expired_at(max_age, Utc::now())
    }

    /// [`clear_expired`](Self::clear_expired) against an explicit clock.
    pub fn clear_expired_at(&self, max_age: Duration, now: DateTime<Utc>) -> Result<usize> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|err| TellmyError::Validation(format!("max age out of range: {err}")))?;
        let cutoff = now
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let expired = self.cached_stories_before(cutoff)?;
        for entry in &expired {
            self.delete_cached_story(&entry.story.id)?;
        }
        debug!(cutoff = %cutoff, deleted = expired.len(), "cleared expired cached stories");
        Ok(expired.len())
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub fn set_preference(&self, key: &str, value: &Value) -> Result<()> {
        if key.trim().is_empty() {
            return Err(TellmyError::Validation(
                "preference key must not be empty".to_string(),
            ));
        }
        self.conn.execute(
            "INSERT INTO user_preferences (key, value_json) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value_json=excluded.value_json",
            params![key, serde_json::to_string(value)?],
        )?;
        Ok(())
    }

    pub fn get_preference(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value_json FROM user_preferences WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }

    /// Typed variant of [`get_preference`](Self::get_preference).
    pub fn get_preference_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        Ok(self
            .get_preference(key)?
            .map(serde_json::from_value)
            .transpose()?)
    }

    pub fn delete_preference(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM user_preferences WHERE key = ?", [key])?;
        Ok(())
    }

    pub fn list_preferences(&self) -> Result<Vec<PreferenceEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value_json FROM user_preferences ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            entries.push(PreferenceEntry {
                key,
                value: serde_json::from_str(&raw)?,
            });
        }
        Ok(entries)
    }

    // =========================================================================
    // Offline queue
    // =========================================================================

    /// Append a deferred mutation. Ids increase monotonically and are never reused.
    pub fn enqueue(&self, kind: MutationKind, data: Option<&Value>, url: &str) -> Result<QueueItem> {
        self.ensure_collection(Collection::OfflineQueue)?;
        if url.trim().is_empty() {
            return Err(TellmyError::Validation(
                "queued mutation needs a target url".to_string(),
            ));
        }
        let timestamp = now();
        let data_json = data.map(serde_json::to_string).transpose()?;
        self.conn.execute(
            "INSERT INTO offline_queue (kind, data_json, url, timestamp, retry_count)
             VALUES (?, ?, ?, ?, 0)",
            params![kind.as_str(), data_json, url, timestamp.timestamp_millis()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(queue_id = id, kind = %kind, url, "queued offline mutation");
        Ok(QueueItem {
            id,
            kind,
            data: data.cloned(),
            url: url.to_string(),
            timestamp,
            retry_count: 0,
            last_error: None,
        })
    }

    /// Every queued mutation in enqueue order.
    pub fn get_offline_queue(&self) -> Result<Vec<QueueItem>> {
        self.ensure_collection(Collection::OfflineQueue)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, data_json, url, timestamp, retry_count, last_error
             FROM offline_queue ORDER BY id",
        )?;
        let rows = stmt.query_map([], queue_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.decode()?);
        }
        Ok(items)
    }

    pub fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>> {
        self.ensure_collection(Collection::OfflineQueue)?;
        let row = self
            .conn
            .query_row(
                "SELECT id, kind, data_json, url, timestamp, retry_count, last_error
                 FROM offline_queue WHERE id = ?",
                [id],
                queue_row,
            )
            .optional()?;
        row.map(QueueRow::decode).transpose()
    }

    pub fn remove_from_offline_queue(&self, id: i64) -> Result<()> {
        self.ensure_collection(Collection::OfflineQueue)?;
        self.conn
            .execute("DELETE FROM offline_queue WHERE id = ?", [id])?;
        Ok(())
    }

    /// Merge `update` into the item; returns false when no such item exists.
    pub fn update_queue_item(&self, id: i64, update: &QueueItemUpdate) -> Result<bool> {
        self.ensure_collection(Collection::OfflineQueue)?;
        let changed = self.conn.execute(
            "UPDATE offline_queue SET
                retry_count = COALESCE(?, retry_count),
                last_error = COALESCE(?, last_error)
             WHERE id = ?",
            params![update.retry_count, update.last_error, id],
        )?;
        Ok(changed > 0)
    }

    /// Bump the retry counter and record why the replay failed, in one statement.
    pub fn record_queue_failure(&self, id: i64, error: &str) -> Result<bool> {
        self.ensure_collection(Collection::OfflineQueue)?;
        let changed = self.conn.execute(
            "UPDATE offline_queue SET retry_count = retry_count + 1, last_error = ?
             WHERE id = ?",
            params![error, id],
        )?;
        Ok(changed > 0)
    }

    // =========================================================================
    // Whole store
    // =========================================================================

    /// Wipe every collection present in the current schema.
    pub fn clear_all(&self) -> Result<()> {
        for collection in Collection::ALL {
            if collection.introduced_in() > self.schema_version {
                continue;
            }
            self.conn
                .execute(&format!("DELETE FROM {}", collection.table()), [])?;
        }
        info!("cleared all local data");
        Ok(())
    }

    /// Best-effort usage report; `None` when it cannot be determined.
    pub fn storage_usage(&self) -> Option<StorageUsage> {
        let path = self.path.as_deref()?;
        let used = match self.database_bytes() {
            Ok(used) => used,
            Err(err) => {
                debug!(error = %err, "page accounting unavailable");
                return None;
            }
        };
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        match fs2::available_space(dir) {
            Ok(available) => Some(StorageUsage::new(used, available)),
            Err(err) => {
                debug!(error = %err, dir = %dir.display(), "free space unavailable");
                None
            }
        }
    }

    fn database_bytes(&self) -> Result<u64> {
        let page_count: i64 = self.conn.query_row("PRAGMA page_count;", [], |row| row.get(0))?;
        let freelist: i64 = self
            .conn
            .query_row("PRAGMA freelist_count;", [], |row| row.get(0))?;
        let page_size: i64 = self.conn.query_row("PRAGMA page_size;", [], |row| row.get(0))?;
        let live_pages = (page_count - freelist).max(0);
        Ok(u64::try_from(live_pages * page_size).unwrap_or(0))
    }

    fn ensure_collection(&self, collection: Collection) -> Result<()> {
        if collection.introduced_in() > self.schema_version {
            return Err(TellmyError::StorageUnavailable(format!(
                "collection {collection} requires schema v{} (store is at v{})",
                collection.introduced_in(),
                self.schema_version
            )));
        }
        Ok(())
    }

    fn story_rows<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<(Story, DateTime<Utc>)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (body, stamp) = row?;
            out.push((serde_json::from_str(&body)?, from_millis(stamp)?));
        }
        Ok(out)
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }
}

struct QueueRow {
    id: i64,
    kind: String,
    data_json: Option<String>,
    url: String,
    timestamp: i64,
    retry_count: i64,
    last_error: Option<String>,
}

impl QueueRow {
    fn decode(self) -> Result<QueueItem> {
        Ok(QueueItem {
            id: self.id,
            kind: self.kind.parse()?,
            data: self
                .data_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            url: self.url,
            timestamp: from_millis(self.timestamp)?,
            retry_count: u32::try_from(self.retry_count).unwrap_or(u32::MAX),
            last_error: self.last_error,
        })
    }
}

fn queue_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueRow> {
    Ok(QueueRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        data_json: row.get(2)?,
        url: row.get(3)?,
        timestamp: row.get(4)?,
        retry_count: row.get(5)?,
        last_error: row.get(6)?,
    })
}

/// Millisecond precision, matching what the store persists.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        TellmyError::StorageUnavailable(format!("stored timestamp out of range: {millis}"))
    })
}
