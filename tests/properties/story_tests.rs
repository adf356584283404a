use proptest::prelude::*;

use tellmy::storage::{LocalStore, Story};

fn coordinate() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(prop_oneof![
        -90.0f64..=90.0,
        -180.0f64..=180.0,
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn stored_stories_read_back_unchanged(
        id in "[a-z0-9-]{1,24}",
        description in ".{0,80}",
        lat in coordinate(),
        lon in coordinate(),
    ) {
        let store = LocalStore::open_in_memory().unwrap();
        let input = Story {
            lat,
            lon,
            ..Story::new(id.clone(), description)
        };

        store.put_saved_story(&input).unwrap();
        store.put_cached_story(&input).unwrap();

        let saved = store.get_saved_story(&id).unwrap().unwrap().story;
        prop_assert_eq!(saved.lat.map(f64::to_bits), lat.map(f64::to_bits));
        prop_assert_eq!(saved.lon.map(f64::to_bits), lon.map(f64::to_bits));
        prop_assert_eq!(&saved, &input);

        let cached = store.get_cached_story(&id).unwrap().unwrap().story;
        prop_assert_eq!(&cached, &input);
    }
}
