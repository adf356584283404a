use std::path::PathBuf;
use std::time::Duration;

use httpmock::MockServer;
use tempfile::TempDir;

use tellmy::api::ApiClient;
use tellmy::storage::{LocalStore, OpenOptions, Story};

/// Temp directory with a store file and a mock API server.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
    pub server: MockServer,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("tellmy.db");
        Self {
            temp_dir,
            db_path,
            server: MockServer::start(),
        }
    }

    pub fn open_store(&self) -> LocalStore {
        LocalStore::open(&self.db_path).unwrap()
    }

    pub fn open_store_at(&self, schema_version: u32) -> LocalStore {
        LocalStore::open_with(
            &self.db_path,
            &OpenOptions {
                schema_version,
                retention: None,
            },
        )
        .unwrap()
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.server.base_url(), Duration::from_secs(5))
            .unwrap()
            .with_token(Some("test-token".to_string()))
    }
}

pub fn story(id: &str) -> Story {
    Story {
        id: id.to_string(),
        name: "Wulan".to_string(),
        description: format!("story {id}"),
        photo_url: Some(format!("https://story-api.dicoding.dev/images/{id}.jpg")),
        ..Story::default()
    }
}
