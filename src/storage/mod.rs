//! Local persistence for tellmy
//!
//! A single SQLite file holding bookmarks, the offline story cache, user
//! preferences and the queue of mutations waiting to be replayed.

pub mod collection;
pub mod migrations;
pub mod records;
pub mod retention;
pub mod sqlite;

pub use collection::Collection;
pub use records::{
    CachedStory, MutationKind, PreferenceEntry, QueueItem, QueueItemUpdate, SavedStory,
    StorageUsage, Story,
};
pub use retention::RetentionPolicy;
pub use sqlite::{LocalStore, OpenOptions};
