use proptest::prelude::*;
use serde_json::json;

use tellmy::Result;
use tellmy::storage::{LocalStore, MutationKind, QueueItem};
use tellmy::sync::{ReplayRequest, ReplayResponse, ReplayTransport, SyncProcessor};

/// Answers each request with the verdict at its payload index.
struct Verdicts(Vec<bool>);

impl ReplayTransport for Verdicts {
    fn replay(&self, request: &ReplayRequest<'_>) -> Result<ReplayResponse> {
        let idx = request
            .body
            .and_then(|body| body["n"].as_u64())
            .unwrap_or_default() as usize;
        let (status, status_text) = if self.0[idx] {
            (201, "Created")
        } else {
            (500, "Internal Server Error")
        };
        Ok(ReplayResponse {
            status,
            status_text: status_text.to_string(),
        })
    }
}

fn arb_kind() -> impl Strategy<Value = MutationKind> {
    prop_oneof![
        Just(MutationKind::Post),
        Just(MutationKind::Put),
        Just(MutationKind::Patch),
        Just(MutationKind::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn enqueue_order_is_preserved(kinds in prop::collection::vec(arb_kind(), 0..20)) {
        let store = LocalStore::open_in_memory().unwrap();
        let mut enqueued = Vec::new();
        for (n, kind) in kinds.iter().enumerate() {
            let item = store.enqueue(*kind, Some(&json!({ "n": n })), "/stories").unwrap();
            enqueued.push(item.id);
        }

        let queue = store.get_offline_queue().unwrap();
        let ids: Vec<i64> = queue.iter().map(|item| item.id).collect();
        prop_assert_eq!(ids, enqueued);
        let read_kinds: Vec<MutationKind> = queue.iter().map(|item| item.kind).collect();
        prop_assert_eq!(read_kinds, kinds);
        prop_assert!(queue.iter().all(|item| item.retry_count == 0 && item.last_error.is_none()));
    }

    #[test]
    fn sync_removes_successes_and_counts_failures(
        verdicts in prop::collection::vec(any::<bool>(), 0..16),
    ) {
        let store = LocalStore::open_in_memory().unwrap();
        for n in 0..verdicts.len() {
            store.enqueue(MutationKind::Post, Some(&json!({ "n": n })), "/stories").unwrap();
        }

        let transport = Verdicts(verdicts.clone());
        let report = SyncProcessor::new(&store, &transport).run().unwrap();
        let successes = verdicts.iter().filter(|ok| **ok).count();
        prop_assert_eq!(report.replayed(), successes);
        prop_assert_eq!(report.failed(), verdicts.len() - successes);

        let remaining: Vec<QueueItem> = store.get_offline_queue().unwrap();
        prop_assert_eq!(remaining.len(), verdicts.len() - successes);
        for item in &remaining {
            prop_assert_eq!(item.retry_count, 1);
            prop_assert_eq!(item.last_error.as_deref(), Some("HTTP 500: Internal Server Error"));
            let n = item.data.as_ref().and_then(|data| data["n"].as_u64()).unwrap() as usize;
            prop_assert!(!verdicts[n]);
        }
    }
}
