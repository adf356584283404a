//! Closed set of record collections held by the local store.

use std::fmt;

use serde::Serialize;

/// A record collection. Table names live here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    SavedStories,
    CachedStories,
    Preferences,
    OfflineQueue,
}

impl Collection {
    pub const ALL: [Self; 4] = [
        Self::SavedStories,
        Self::CachedStories,
        Self::Preferences,
        Self::OfflineQueue,
    ];

    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::SavedStories => "saved_stories",
            Self::CachedStories => "cached_stories",
            Self::Preferences => "user_preferences",
            Self::OfflineQueue => "offline_queue",
        }
    }

    /// Schema version whose migration creates this collection.
    #[must_use]
    pub const fn introduced_in(self) -> u32 {
        match self {
            Self::SavedStories | Self::CachedStories | Self::Preferences => 1,
            Self::OfflineQueue => 2,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SavedStories => "saved-stories",
            Self::CachedStories => "cached-stories",
            Self::Preferences => "user-preferences",
            Self::OfflineQueue => "offline-queue",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
