//! Seam between the sync processor and the network.

use serde_json::Value;

use crate::error::Result;
use crate::storage::{MutationKind, QueueItem};

/// HTTP method used to replay a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMethod {
    Post,
    Delete,
}

/// A queued mutation rendered as a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayRequest<'a> {
    pub method: ReplayMethod,
    /// Absolute URL or a path relative to the API base URL.
    pub url: &'a str,
    pub body: Option<&'a Value>,
}

impl<'a> ReplayRequest<'a> {
    /// `DELETE` items replay as DELETE; every other kind replays as POST.
    pub fn from_item(item: &'a QueueItem) -> Self {
        let method = match item.kind {
            MutationKind::Delete => ReplayMethod::Delete,
            MutationKind::Post | MutationKind::Put | MutationKind::Patch => ReplayMethod::Post,
        };
        Self {
            method,
            url: &item.url,
            body: item.data.as_ref(),
        }
    }
}

/// Status line of a replayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResponse {
    pub status: u16,
    pub status_text: String,
}

impl ReplayResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Human-readable failure cause recorded on the queue item.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("HTTP {}: {}", self.status, self.status_text)
    }
}

/// Sends replay requests. An `Err` means the request never produced a response.
pub trait ReplayTransport {
    fn replay(&self, request: &ReplayRequest<'_>) -> Result<ReplayResponse>;
}

impl<T: ReplayTransport + ?Sized> ReplayTransport for &T {
    fn replay(&self, request: &ReplayRequest<'_>) -> Result<ReplayResponse> {
        (**self).replay(request)
    }
}
