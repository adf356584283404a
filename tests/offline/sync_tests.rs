use httpmock::prelude::*;
use serde_json::json;

use tellmy::storage::MutationKind;
use tellmy::sync::{SyncOutcome, SyncProcessor};

use crate::fixture::TestFixture;

#[test]
fn three_items_middle_one_fails() {
    let fixture = TestFixture::new();
    let first = fixture.server.mock(|when, then| {
        when.method(POST).path("/stories").body_includes("\"n\":1");
        then.status(201).json_body(json!({"error": false, "message": "success"}));
    });
    let second = fixture.server.mock(|when, then| {
        when.method(POST).path("/stories").body_includes("\"n\":2");
        then.status(500);
    });
    let third = fixture.server.mock(|when, then| {
        when.method(POST).path("/stories").body_includes("\"n\":3");
        then.status(201).json_body(json!({"error": false, "message": "success"}));
    });

    let store = fixture.open_store();
    for n in 1..=3 {
        store
            .enqueue(MutationKind::Post, Some(&json!({ "n": n })), "/stories")
            .unwrap();
    }
    let second_id = store.get_offline_queue().unwrap()[1].id;

    let api = fixture.api();
    let report = SyncProcessor::new(&store, &api).run().unwrap();

    first.assert();
    second.assert();
    third.assert();
    assert_eq!(report.replayed(), 2);
    assert_eq!(report.failed(), 1);

    let remaining = store.get_offline_queue().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second_id);
    assert_eq!(remaining[0].retry_count, 1);
    assert_eq!(
        remaining[0].last_error.as_deref(),
        Some("HTTP 500: Internal Server Error")
    );

    // Nothing changes for the remaining item until the next pass.
    let again = SyncProcessor::new(&store, &api).run().unwrap();
    assert_eq!(again.failed(), 1);
    assert_eq!(store.get_queue_item(second_id).unwrap().unwrap().retry_count, 2);
}

#[test]
fn delete_items_replay_with_bearer() {
    let fixture = TestFixture::new();
    let unsubscribe = fixture.server.mock(|when, then| {
        when.method(DELETE)
            .path("/notifications/subscribe")
            .header("authorization", "Bearer test-token")
            .json_body(json!({"endpoint": "https://push.example/1"}));
        then.status(200).json_body(json!({"error": false, "message": "ok"}));
    });

    let store = fixture.open_store();
    store
        .enqueue(
            MutationKind::Delete,
            Some(&json!({"endpoint": "https://push.example/1"})),
            "/notifications/subscribe",
        )
        .unwrap();

    let report = SyncProcessor::new(&store, &fixture.api()).run().unwrap();
    unsubscribe.assert();
    assert!(matches!(
        report.outcomes[0].outcome,
        SyncOutcome::Replayed { record_error: None }
    ));
    assert!(store.get_offline_queue().unwrap().is_empty());
}

#[test]
fn unreachable_api_records_transport_error() {
    let fixture = TestFixture::new();
    let store = fixture.open_store();
    store.enqueue(MutationKind::Post, None, "/stories").unwrap();

    let api = tellmy::api::ApiClient::new("http://127.0.0.1:9", std::time::Duration::from_millis(500))
        .unwrap();
    let report = SyncProcessor::new(&store, &api).run().unwrap();
    assert_eq!(report.failed(), 1);

    let item = &store.get_offline_queue().unwrap()[0];
    assert_eq!(item.retry_count, 1);
    assert!(item.last_error.as_deref().unwrap().starts_with("Network error"));
}

#[test]
fn absolute_urls_bypass_base() {
    let fixture = TestFixture::new();
    let elsewhere = MockServer::start();
    let hit = elsewhere.mock(|when, then| {
        when.method(POST).path("/hooks/story");
        then.status(204);
    });

    let store = fixture.open_store();
    store
        .enqueue(MutationKind::Post, None, &elsewhere.url("/hooks/story"))
        .unwrap();
    let report = SyncProcessor::new(&store, &fixture.api()).run().unwrap();
    hit.assert();
    assert_eq!(report.replayed(), 1);
}
