//! Per-item results of a sync pass.

use serde::Serialize;

/// What happened to one queued mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Replayed with a 2xx response and removed from the queue.
    Replayed {
        /// Set when the item could not be removed afterwards.
        #[serde(skip_serializing_if = "Option::is_none")]
        record_error: Option<String>,
    },
    /// Replay failed; the item stays queued with its retry count bumped.
    Failed {
        error: String,
        /// Set when the failure itself could not be written back to the store.
        #[serde(skip_serializing_if = "Option::is_none")]
        record_error: Option<String>,
    },
    /// Not attempted because the run was cancelled.
    Cancelled,
    /// Not attempted because the item reached the retry cap.
    Exhausted { retry_count: u32 },
}

impl SyncOutcome {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Replayed { .. } => "replayed",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::Exhausted { .. } => "exhausted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub queue_id: i64,
    pub url: String,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Result of one pass over the offline queue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Outcomes in queue order.
    pub outcomes: Vec<ItemOutcome>,
    pub duration_ms: u128,
}

impl SyncReport {
    pub fn replayed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Replayed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Cancelled))
    }

    pub fn exhausted(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Exhausted { .. }))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{} replayed, {} failed, {} cancelled, {} exhausted ({} ms)",
            self.replayed(),
            self.failed(),
            self.cancelled(),
            self.exhausted(),
            self.duration_ms
        )
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}
