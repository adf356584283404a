//! Bookmarks over the saved-stories collection.

use tracing::info;

use crate::error::Result;
use crate::storage::{LocalStore, SavedStory, Story};

pub struct Bookmarks<'a> {
    store: &'a LocalStore,
}

impl<'a> Bookmarks<'a> {
    pub const fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    pub fn save(&self, story: &Story) -> Result<SavedStory> {
        let saved = self.store.put_saved_story(story)?;
        info!(story_id = %story.id, "bookmarked");
        Ok(saved)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.store.delete_saved_story(id)?;
        info!(story_id = %id, "bookmark removed");
        Ok(())
    }

    pub fn is_bookmarked(&self, id: &str) -> Result<bool> {
        self.store.is_saved_story(id)
    }

    pub fn list(&self) -> Result<Vec<SavedStory>> {
        self.store.get_all_saved_stories()
    }

    /// Flip the bookmark state of `story`; returns whether it is now bookmarked.
    pub fn toggle(&self, story: &Story) -> Result<bool> {
        if self.is_bookmarked(&story.id)? {
            self.remove(&story.id)?;
            Ok(false)
        } else {
            self.save(story)?;
            Ok(true)
        }
    }
}
