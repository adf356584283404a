//! Application flows built on the local store and the Story API.

pub mod bookmarks;
pub mod push;
pub mod session;
pub mod stories;

pub use bookmarks::Bookmarks;
pub use push::{PushService, PushStatus};
pub use session::Session;
pub use stories::{Loaded, Source, StoryDetail, StoryList, StoryService, Submission};
