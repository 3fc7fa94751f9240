//! Property-based tests for the mutation serializer
//!
//! Each transform records how many users it saw and adds one. If the
//! exclusive sections never interleave and no update is lost, the counts
//! seen by committed transforms are exactly 0, 1, 2, ... in lock order.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};

use msgrelay::backend::store::{MemoryStore, Store, ValidationFailure};
use msgrelay::shared::User;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_commits_apply_in_lock_order(accept in prop::collection::vec(any::<bool>(), 1..24)) {
        let rt = runtime();
        let (log, final_users, revision, marker) = rt.block_on(async {
            let backend = MemoryStore::new();
            let store = Store::new(Arc::new(backend.clone()));
            let log: Arc<Mutex<Vec<(usize, usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));

            let mut handles = Vec::new();
            for (n, ok) in accept.iter().copied().enumerate() {
                let store = store.clone();
                let log = Arc::clone(&log);
                handles.push(tokio::spawn(async move {
                    store
                        .update(move |data| {
                            let seen = data.users.len();
                            log.lock().unwrap().push((n, seen, ok));
                            if !ok {
                                return Err(ValidationFailure::bad_input("n", "rejected"));
                            }
                            let user = User::new(format!("user{}", n), "prop");
                            data.users.insert(user.id, user);
                            Ok(())
                        })
                        .await
                }));
            }
            for handle in handles {
                let _ = handle.await.unwrap();
            }

            let log = log.lock().unwrap().clone();
            let record = backend.snapshot();
            (log, record.data.users.len(), store.current_revision(), record.marker)
        });

        let committed = accept.iter().filter(|ok| **ok).count();
        prop_assert_eq!(log.len(), accept.len());
        prop_assert_eq!(final_users, committed);
        prop_assert_eq!(revision, committed as u64);
        prop_assert_eq!(marker, committed as u64);

        let mut expected_seen = 0;
        for (_, seen, ok) in log {
            prop_assert_eq!(seen, expected_seen);
            if ok {
                expected_seen += 1;
            }
        }
    }
}
