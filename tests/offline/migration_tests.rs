use serde_json::json;

use tellmy::TellmyError;
use tellmy::storage::migrations::SCHEMA_VERSION;
use tellmy::storage::{Collection, MutationKind};

use crate::fixture::{TestFixture, story};

#[test]
fn v1_store_upgrades_in_place() {
    let fixture = TestFixture::new();
    {
        let store = fixture.open_store_at(1);
        assert_eq!(store.schema_version(), 1);
        store.put_saved_story(&story("story-a")).unwrap();
        store.put_cached_story(&story("story-b")).unwrap();
        store.set_preference("theme", &json!("dark")).unwrap();

        let err = store.get_offline_queue().unwrap_err();
        assert!(matches!(err, TellmyError::StorageUnavailable(_)));
        store.close().unwrap();
    }

    let store = fixture.open_store();
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    assert!(store.is_saved_story("story-a").unwrap());
    assert!(store.get_cached_story("story-b").unwrap().is_some());
    assert_eq!(store.get_preference("theme").unwrap(), Some(json!("dark")));

    assert!(store.get_offline_queue().unwrap().is_empty());
    store.enqueue(MutationKind::Post, None, "/stories").unwrap();
    assert_eq!(store.count(Collection::OfflineQueue).unwrap(), 1);
}

#[test]
fn v2_store_gains_category_lookup() {
    let fixture = TestFixture::new();
    {
        let store = fixture.open_store_at(2);
        let mut cached = story("story-c");
        cached.extra.insert("category".to_string(), json!("travel"));
        store.put_cached_story(&cached).unwrap();
        store.close().unwrap();
    }

    let store = fixture.open_store();
    assert_eq!(store.schema_version(), 3);
    let found = store.cached_stories_in_category("travel").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].story.id, "story-c");
}

#[test]
fn reopening_current_schema_is_a_no_op() {
    let fixture = TestFixture::new();
    {
        let store = fixture.open_store();
        store.enqueue(MutationKind::Delete, None, "/notifications/subscribe").unwrap();
    }
    let store = fixture.open_store();
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    assert_eq!(store.count(Collection::OfflineQueue).unwrap(), 1);
}

#[test]
fn older_target_does_not_downgrade() {
    let fixture = TestFixture::new();
    drop(fixture.open_store());

    let store = fixture.open_store_at(1);
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    assert!(store.get_offline_queue().unwrap().is_empty());
}

#[test]
fn clear_all_wipes_every_collection() {
    let fixture = TestFixture::new();
    let store = fixture.open_store();
    store.put_saved_story(&story("story-a")).unwrap();
    store.put_cached_story(&story("story-a")).unwrap();
    store.set_preference("theme", &json!("light")).unwrap();
    store.enqueue(MutationKind::Post, None, "/stories").unwrap();

    store.clear_all().unwrap();
    for collection in Collection::ALL {
        assert_eq!(store.count(collection).unwrap(), 0, "{collection} not empty");
    }
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
}
