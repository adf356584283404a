use httpmock::prelude::*;
use serde_json::json;

use tellmy::api::{NewStory, StoryQuery};
use tellmy::network::FixedConnectivity;
use tellmy::services::{Bookmarks, Source, StoryService, Submission};
use tellmy::storage::Collection;
use tellmy::sync::SyncProcessor;
use tellmy::TellmyError;

use crate::fixture::{TestFixture, story};

#[test]
fn story_written_offline_reaches_api_after_sync() {
    let fixture = TestFixture::new();
    let store = fixture.open_store();
    let api = fixture.api();

    let offline = StoryService::new(&store, &api, &FixedConnectivity::OFFLINE);
    let submission = offline
        .submit_story(&NewStory {
            description: "Morning market in Malang".to_string(),
            photo: None,
            lat: Some(-7.98),
            lon: Some(112.63),
        })
        .unwrap();
    let Submission::Queued { item } = submission else {
        panic!("expected the story to be queued");
    };
    assert_eq!(item.url, "/stories");

    let upload = fixture.server.mock(|when, then| {
        when.method(POST)
            .path("/stories")
            .header("authorization", "Bearer test-token")
            .body_includes("Morning market in Malang");
        then.status(201)
            .json_body(json!({"error": false, "message": "Story created successfully"}));
    });

    let report = SyncProcessor::new(&store, &api).run().unwrap();
    upload.assert();
    assert_eq!(report.replayed(), 1);
    assert_eq!(store.count(Collection::OfflineQueue).unwrap(), 0);
}

#[test]
fn feed_fetched_online_is_readable_offline() {
    let fixture = TestFixture::new();
    fixture.server.mock(|when, then| {
        when.method(GET).path("/stories").query_param("page", "1");
        then.status(200).json_body(json!({
            "error": false,
            "message": "Stories fetched successfully",
            "listStory": [
                {"id": "story-a", "name": "Wulan", "description": "first"},
                {"id": "story-b", "name": "Bayu", "description": "second"}
            ]
        }));
    });

    let store = fixture.open_store();
    let api = fixture.api();

    let online = StoryService::new(&store, &api, &FixedConnectivity::ONLINE);
    let loaded = online.load_stories(&StoryQuery::default()).unwrap();
    assert_eq!(loaded.source, Source::Remote);
    assert_eq!(loaded.value.stories.len(), 2);
    drop(store);

    let store = fixture.open_store();
    let offline = StoryService::new(&store, &api, &FixedConnectivity::OFFLINE);
    let cached = offline.load_stories(&StoryQuery::default()).unwrap();
    assert_eq!(cached.source, Source::Cache);
    let ids: Vec<_> = cached.value.stories.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["story-a", "story-b"]);

    let detail = offline.load_story_detail("story-b").unwrap();
    assert_eq!(detail.value.story.description, "second");
}

#[test]
fn server_error_falls_back_to_cached_detail() {
    let fixture = TestFixture::new();
    for id in ["story-a", "story-z"] {
        fixture.server.mock(|when, then| {
            when.method(GET).path(format!("/stories/{id}"));
            then.status(502);
        });
    }

    let store = fixture.open_store();
    store.put_cached_story(&story("story-a")).unwrap();
    let api = fixture.api();

    let online = StoryService::new(&store, &api, &FixedConnectivity::ONLINE);
    let loaded = online.load_story_detail("story-a").unwrap();
    assert_eq!(loaded.source, Source::Cache);

    let err = online.load_story_detail("story-z").unwrap_err();
    assert!(matches!(err, TellmyError::Http { status: 502, .. }));
}

#[test]
fn bookmarks_survive_reopen_and_cache_pruning() {
    let fixture = TestFixture::new();
    {
        let store = fixture.open_store();
        let bookmarks = Bookmarks::new(&store);
        bookmarks.save(&story("story-a")).unwrap();
        bookmarks.save(&story("story-b")).unwrap();
        store.put_cached_story(&story("story-a")).unwrap();
        store.close().unwrap();
    }

    let store = fixture.open_store();
    store
        .clear_expired_at(std::time::Duration::ZERO, chrono::Utc::now() + chrono::Duration::days(1))
        .unwrap();
    assert_eq!(store.count(Collection::CachedStories).unwrap(), 0);

    let bookmarks = Bookmarks::new(&store);
    assert!(bookmarks.is_bookmarked("story-a").unwrap());
    let ids: Vec<_> = bookmarks
        .list()
        .unwrap()
        .into_iter()
        .map(|saved| saved.story.id)
        .collect();
    assert_eq!(ids, ["story-a", "story-b"]);
}
