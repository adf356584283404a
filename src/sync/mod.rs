//! Offline queue synchronization
//!
//! Mutations attempted while offline are parked in the store's offline queue.
//! [`SyncProcessor`] replays them against the Story API in enqueue order and
//! writes each outcome back to the queue.

pub mod outcome;
pub mod processor;
pub mod transport;

pub use outcome::{ItemOutcome, SyncOutcome, SyncReport};
pub use processor::{CancelToken, SyncProcessor};
pub use transport::{ReplayMethod, ReplayRequest, ReplayResponse, ReplayTransport};
