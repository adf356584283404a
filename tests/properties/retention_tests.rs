use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use tellmy::storage::{Collection, LocalStore, OpenOptions, Story};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn store() -> LocalStore {
    LocalStore::open_in_memory_with(&OpenOptions {
        retention: None,
        ..OpenOptions::default()
    })
    .unwrap()
}

fn at(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn eviction_keeps_exactly_the_fresh_entries(
        ages in prop::collection::vec(0i64..30 * DAY_MS, 0..24),
        max_age_days in 0u32..14,
    ) {
        let store = store();
        let now_ms = 1_750_000_000_000i64;
        let now = at(now_ms);
        for (idx, age) in ages.iter().enumerate() {
            store
                .put_cached_story_at(&Story::new(format!("story-{idx}"), "cached"), at(now_ms - age))
                .unwrap();
        }

        let max_age = Duration::from_secs(u64::from(max_age_days) * 24 * 60 * 60);
        let cutoff_ms = now_ms - i64::from(max_age_days) * DAY_MS;
        let expected: BTreeSet<String> = ages
            .iter()
            .enumerate()
            .filter(|(_, age)| now_ms - **age >= cutoff_ms)
            .map(|(idx, _)| format!("story-{idx}"))
            .collect();

        let deleted = store.clear_expired_at(max_age, now).unwrap();
        prop_assert_eq!(deleted, ages.len() - expected.len());

        let kept: BTreeSet<String> = store
            .get_all_cached_stories()
            .unwrap()
            .into_iter()
            .map(|cached| cached.story.id)
            .collect();
        prop_assert_eq!(&kept, &expected);

        // A second pass at the same instant has nothing left to do.
        prop_assert_eq!(store.clear_expired_at(max_age, now).unwrap(), 0);
        prop_assert_eq!(store.count(Collection::CachedStories).unwrap(), expected.len());
    }

    #[test]
    fn eviction_never_touches_bookmarks(
        ids in prop::collection::btree_set("[a-z]{3,10}", 1..12),
    ) {
        let store = store();
        let long_ago = at(0);
        for id in &ids {
            let story = Story::new(id.clone(), "both");
            store.put_saved_story(&story).unwrap();
            store.put_cached_story_at(&story, long_ago).unwrap();
        }

        let deleted = store.clear_expired(Duration::from_secs(60)).unwrap();
        prop_assert_eq!(deleted, ids.len());
        prop_assert_eq!(store.count(Collection::SavedStories).unwrap(), ids.len());
        for id in &ids {
            prop_assert!(store.is_saved_story(id).unwrap());
        }
    }
}
