//! Offline-aware story flows: submission, feed and detail loading.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, ApiMessage, NewStory, StoryQuery};
use crate::error::{Result, TellmyError};
use crate::network::Connectivity;
use crate::storage::{LocalStore, MutationKind, QueueItem, Story};

/// Endpoint queued story submissions are replayed against.
pub const STORIES_ENDPOINT: &str = "/stories";

/// Where a mutation ended up: sent now, or parked in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Submission {
    Sent { message: String },
    Queued { item: QueueItem },
}

/// Where loaded stories came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Remote,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loaded<T> {
    pub source: Source,
    #[serde(flatten)]
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryList {
    pub stories: Vec<Story>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryDetail {
    pub story: Story,
}

pub struct StoryService<'a> {
    store: &'a LocalStore,
    api: &'a ApiClient,
    connectivity: &'a dyn Connectivity,
}

impl<'a> StoryService<'a> {
    pub fn new(
        store: &'a LocalStore,
        api: &'a ApiClient,
        connectivity: &'a dyn Connectivity,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
        }
    }

    /// Post a story now, or queue it for the next sync when that is not possible.
    pub fn submit_story(&self, story: &NewStory) -> Result<Submission> {
        if story.description.trim().is_empty() {
            return Err(TellmyError::Validation(
                "story description must not be empty".to_string(),
            ));
        }
        if self.connectivity.is_offline() {
            info!("offline, queueing story");
            return self.enqueue(story);
        }

        let sent = if self.api.token().is_some() {
            self.api.add_story(story)
        } else {
            self.api.add_story_guest(story)
        };
        match sent {
            Ok(ApiMessage { message, .. }) => Ok(Submission::Sent { message }),
            Err(err @ TellmyError::Network(_)) => {
                warn!(error = %err, "story upload failed, queueing for later");
                self.enqueue(story)
            }
            Err(err) => Err(err),
        }
    }

    fn enqueue(&self, story: &NewStory) -> Result<Submission> {
        let payload = offline_payload(story);
        let item = self
            .store
            .enqueue(MutationKind::Post, Some(&payload), STORIES_ENDPOINT)?;
        Ok(Submission::Queued { item })
    }

    /// Load one story, preferring the network and keeping the cache warm.
    pub fn load_story_detail(&self, id: &str) -> Result<Loaded<StoryDetail>> {
        if self.connectivity.is_offline() {
            return self.cached_detail(id);
        }
        match self.api.story_detail(id) {
            Ok(story) => {
                self.write_through(&story);
                Ok(Loaded {
                    source: Source::Remote,
                    value: StoryDetail { story },
                })
            }
            Err(err) if err.is_transient() => {
                warn!(story_id = %id, error = %err, "fetch failed, trying cache");
                self.cached_detail(id).map_err(|_| err)
            }
            Err(err) => Err(err),
        }
    }

    /// Load a page of the feed; offline, the cached stories stand in for it.
    pub fn load_stories(&self, query: &StoryQuery) -> Result<Loaded<StoryList>> {
        if self.connectivity.is_offline() {
            return self.cached_list();
        }
        match self.api.list_stories(query) {
            Ok(stories) => {
                for story in &stories {
                    self.write_through(story);
                }
                Ok(Loaded {
                    source: Source::Remote,
                    value: StoryList { stories },
                })
            }
            Err(err) if err.is_transient() => {
                warn!(error = %err, "feed fetch failed, using cache");
                self.cached_list()
            }
            Err(err) => Err(err),
        }
    }

    fn cached_detail(&self, id: &str) -> Result<Loaded<StoryDetail>> {
        let cached = self
            .store
            .get_cached_story(id)?
            .ok_or_else(|| TellmyError::NotFound(format!("story {id} is not cached")))?;
        Ok(Loaded {
            source: Source::Cache,
            value: StoryDetail {
                story: cached.story,
            },
        })
    }

    fn cached_list(&self) -> Result<Loaded<StoryList>> {
        let stories = self
            .store
            .get_all_cached_stories()?
            .into_iter()
            .map(|cached| cached.story)
            .collect();
        Ok(Loaded {
            source: Source::Cache,
            value: StoryList { stories },
        })
    }

    fn write_through(&self, story: &Story) {
        if let Err(err) = self.store.put_cached_story(story) {
            warn!(story_id = %story.id, error = %err, "could not cache story");
        }
    }
}

/// JSON body replayed for a story submitted while offline.
fn offline_payload(story: &NewStory) -> Value {
    let mut payload = json!({
        "id": format!("offline-{}", Uuid::new_v4()),
        "description": story.description,
        "createdAt": Utc::now().to_rfc3339(),
    });
    if let Some(photo) = &story.photo {
        payload["photoPath"] = Value::from(photo.display().to_string());
    }
    if let (Some(lat), Some(lon)) = (story.lat, story.lon) {
        payload["lat"] = Value::from(lat);
        payload["lon"] = Value::from(lon);
    }
    payload
}
