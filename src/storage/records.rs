//! Record types persisted by the local store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TellmyError};

/// A story as exchanged with the Story API.
///
/// Fields the client does not model are kept in `extra` so a cached copy
/// renders the same as the remote one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default)]
    pub id: String,
    /// Author display name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Local image references attached to a story that has not been uploaded yet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Reject records that cannot be keyed.
    pub fn validate_key(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TellmyError::Validation(
                "`id` is required to store a story".to_string(),
            ));
        }
        Ok(())
    }
}

/// A bookmarked story.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStory {
    #[serde(flatten)]
    pub story: Story,
    pub saved_at: DateTime<Utc>,
}

/// A story kept for offline reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStory {
    #[serde(flatten)]
    pub story: Story,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceEntry {
    pub key: String,
    pub value: Value,
}

/// HTTP intent of a deferred mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    Post,
    Put,
    Patch,
    Delete,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = TellmyError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(TellmyError::Validation(format!(
                "unknown mutation kind: {other} (use POST|PUT|PATCH|DELETE)"
            ))),
        }
    }
}

/// A mutation deferred while offline, replayed by the sync processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: MutationKind,
    pub data: Option<Value>,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Partial update applied to a queue item; `None` fields are left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueItemUpdate {
    pub retry_count: Option<u32>,
    pub last_error: Option<String>,
}

/// Best-effort disk usage report for the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    /// Bytes occupied by live database pages.
    pub used: u64,
    /// Bytes still free on the volume holding the database.
    pub available: u64,
    pub used_percent: u8,
}

impl StorageUsage {
    #[must_use]
    pub fn new(used: u64, available: u64) -> Self {
        let total = used.saturating_add(available);
        let used_percent = if total == 0 {
            0
        } else {
            // Rounded; bounded by 100 because used <= total.
            u8::try_from((used.saturating_mul(100) + total / 2) / total).unwrap_or(100)
        };
        Self {
            used,
            available,
            used_percent,
        }
    }
}
