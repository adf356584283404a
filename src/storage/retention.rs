//! Cache retention: evict cached stories past their maximum age.

use std::time::Duration;

use tracing::{info, warn};

use super::sqlite::LocalStore;
use crate::error::Result;

pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::days(DEFAULT_MAX_AGE_DAYS)
    }
}

impl RetentionPolicy {
    #[must_use]
    pub const fn days(days: u32) -> Self {
        Self {
            max_age: Duration::from_secs(days as u64 * SECS_PER_DAY),
        }
    }

    /// Evict expired cached stories and return how many were removed.
    pub fn apply(&self, store: &LocalStore) -> Result<usize> {
        store.clear_expired(self.max_age)
    }

    /// Run [`apply`](Self::apply) during store initialization. Never fails.
    pub fn apply_on_startup(&self, store: &LocalStore) {
        match self.apply(store) {
            Ok(deleted) => info!(
                deleted,
                max_age_secs = self.max_age.as_secs(),
                "cache retention pass complete"
            ),
            Err(err) => warn!(error = %err, "cache retention pass failed"),
        }
    }
}
