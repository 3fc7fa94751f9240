//! Concurrent mutations against the same entity: one valid, one rejected

use pretty_assertions::assert_eq;
use std::sync::Arc;
use uuid::Uuid;

use crate::common::seeded_data_set;
use msgrelay::backend::store::{
    MemoryStore, MutationError, PersistedRecord, Store, ValidationFailure,
};
use msgrelay::shared::DataSet;

#[derive(Clone, Copy, Debug)]
enum Order {
    ValidFirst,
    RejectedFirst,
}

/// Rename the seeded thread; always succeeds
fn rename(thread_id: Uuid) -> impl FnOnce(&mut DataSet) -> Result<(), ValidationFailure> + Send + 'static {
    move |data: &mut DataSet| {
        let thread = data
            .threads
            .get_mut(&thread_id)
            .ok_or_else(|| ValidationFailure::not_found("thread", thread_id))?;
        thread.title = Some("renamed".to_string());
        Ok(())
    }
}

/// Add a participant who does not exist; edits the thread, then fails
fn add_ghost(thread_id: Uuid) -> impl FnOnce(&mut DataSet) -> Result<(), ValidationFailure> + Send + 'static {
    move |data: &mut DataSet| {
        let ghost = Uuid::from_u128(99);
        let thread = data
            .threads
            .get_mut(&thread_id)
            .ok_or_else(|| ValidationFailure::not_found("thread", thread_id))?;
        thread.participants.push(ghost);
        if !data.users.contains_key(&ghost) {
            return Err(ValidationFailure::not_found("user", ghost));
        }
        Ok(())
    }
}

async fn run(order: Order) -> (DataSet, u64, Vec<Result<(), MutationError>>) {
    let (data, thread_id) = seeded_data_set();
    let backend = MemoryStore::with_record(PersistedRecord { marker: 0, data });
    let store = Store::new(Arc::new(backend.clone()));

    let valid = {
        let store = store.clone();
        async move { store.update(rename(thread_id)).await }
    };
    let rejected = {
        let store = store.clone();
        async move { store.update(add_ghost(thread_id)).await }
    };

    let results = match order {
        Order::ValidFirst => {
            let (a, b) = tokio::join!(valid, rejected);
            vec![a, b]
        }
        Order::RejectedFirst => {
            let (b, a) = tokio::join!(rejected, valid);
            vec![a, b]
        }
    };

    let record = backend.snapshot();
    assert_eq!(store.current_revision(), 1, "{:?}", order);
    (record.data, record.marker, results)
}

#[tokio::test]
async fn test_one_change_persisted_one_failure_surfaced_in_either_order() {
    let (data_a, marker_a, results_a) = run(Order::ValidFirst).await;
    let (data_b, marker_b, results_b) = run(Order::RejectedFirst).await;

    for results in [&results_a, &results_b] {
        assert!(results[0].is_ok());
        match &results[1] {
            Err(MutationError::Validation(ValidationFailure::NotFound { entity, .. })) => {
                assert_eq!(*entity, "user");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    assert_eq!(marker_a, 1);
    assert_eq!(marker_b, 1);
    assert_eq!(data_a, data_b);

    let (seeded, thread_id) = seeded_data_set();
    let thread = &data_a.threads[&thread_id];
    assert_eq!(thread.title.as_deref(), Some("renamed"));
    assert_eq!(thread.participants, seeded.threads[&thread_id].participants);
}

#[tokio::test]
async fn test_many_concurrent_attempts_in_both_orders() {
    for order in [Order::ValidFirst, Order::RejectedFirst] {
        let (data, thread_id) = seeded_data_set();
        let backend = MemoryStore::with_record(PersistedRecord { marker: 0, data });
        let store = Store::new(Arc::new(backend.clone()));

        let mut handles = Vec::new();
        for n in 0..10 {
            let store = store.clone();
            let valid_turn = match order {
                Order::ValidFirst => n % 2 == 0,
                Order::RejectedFirst => n % 2 == 1,
            };
            handles.push(tokio::spawn(async move {
                if valid_turn {
                    store.update(rename(thread_id)).await
                } else {
                    store.update(add_ghost(thread_id)).await
                }
            }));
        }

        let mut failures = 0;
        for handle in handles {
            if handle.await.unwrap().is_err() {
                failures += 1;
            }
        }

        assert_eq!(failures, 5);
        assert_eq!(store.current_revision(), 5);
        let record = backend.snapshot();
        assert_eq!(record.marker, 5);
        assert_eq!(record.data.threads[&thread_id].participants.len(), 2);
    }
}
