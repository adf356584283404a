//! Offline queue replay.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::outcome::{ItemOutcome, SyncOutcome, SyncReport};
use super::transport::{ReplayRequest, ReplayTransport};
use crate::error::Result;
use crate::storage::{LocalStore, QueueItem};

/// Cooperative cancellation flag shared between a sync run and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel once `delay` has elapsed. A zero delay cancels immediately.
    pub fn cancel_after(&self, delay: Duration) {
        if delay.is_zero() {
            self.cancel();
            return;
        }
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            debug!(delay_ms = delay.as_millis(), "sync time budget spent");
            token.cancel();
        });
    }
}

/// Drains the offline queue through a [`ReplayTransport`], one item at a time.
pub struct SyncProcessor<'a, T> {
    store: &'a LocalStore,
    transport: T,
    max_retries: Option<u32>,
}

impl<'a, T: ReplayTransport> SyncProcessor<'a, T> {
    pub const fn new(store: &'a LocalStore, transport: T) -> Self {
        Self {
            store,
            transport,
            max_retries: None,
        }
    }

    /// Skip items whose retry count has reached `cap`. `None` retries forever.
    #[must_use]
    pub const fn with_max_retries(mut self, cap: Option<u32>) -> Self {
        self.max_retries = cap;
        self
    }

    pub fn run(&self) -> Result<SyncReport> {
        self.run_with_cancel(&CancelToken::new())
    }

    /// Replay every queued item in id order.
    ///
    /// Only the initial queue read can fail the run. Per-item failures are
    /// recorded on the item and reported in its outcome; once `cancel` fires the
    /// remaining items are left untouched and reported as cancelled.
    pub fn run_with_cancel(&self, cancel: &CancelToken) -> Result<SyncReport> {
        let started = Instant::now();
        let queue = self.store.get_offline_queue()?;
        info!(pending = queue.len(), "replaying offline queue");

        let mut outcomes = Vec::with_capacity(queue.len());
        for item in &queue {
            let outcome = if cancel.is_cancelled() {
                SyncOutcome::Cancelled
            } else {
                match self.max_retries {
                    Some(cap) if item.retry_count >= cap => {
                        debug!(queue_id = item.id, retry_count = item.retry_count, "retry cap reached");
                        SyncOutcome::Exhausted {
                            retry_count: item.retry_count,
                        }
                    }
                    _ => self.replay_item(item),
                }
            };
            outcomes.push(ItemOutcome {
                queue_id: item.id,
                url: item.url.clone(),
                outcome,
            });
        }

        let report = SyncReport {
            outcomes,
            duration_ms: started.elapsed().as_millis(),
        };
        info!(
            replayed = report.replayed(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            exhausted = report.exhausted(),
            duration_ms = report.duration_ms,
            "offline queue replay finished"
        );
        Ok(report)
    }

    fn replay_item(&self, item: &QueueItem) -> SyncOutcome {
        let request = ReplayRequest::from_item(item);
        let error = match self.transport.replay(&request) {
            Ok(response) if response.is_success() => {
                debug!(queue_id = item.id, status = response.status, "replayed");
                let record_error = self
                    .store
                    .remove_from_offline_queue(item.id)
                    .err()
                    .map(|err| {
                        warn!(queue_id = item.id, error = %err, "replayed item could not be dequeued");
                        err.to_string()
                    });
                return SyncOutcome::Replayed { record_error };
            }
            Ok(response) => response.describe(),
            Err(err) => err.to_string(),
        };

        warn!(queue_id = item.id, url = %item.url, error = %error, "replay failed");
        let record_error = match self.store.record_queue_failure(item.id, &error) {
            Ok(true) => None,
            Ok(false) => Some(format!("queue item {} no longer exists", item.id)),
            Err(err) => Some(err.to_string()),
        };
        if let Some(record_error) = &record_error {
            warn!(queue_id = item.id, error = %record_error, "could not record replay failure");
        }
        SyncOutcome::Failed {
            error,
            record_error,
        }
    }
}
