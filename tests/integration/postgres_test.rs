//! PostgreSQL backend tests
//!
//! Skipped unless `TEST_DATABASE_URL` points at a disposable database.

use std::sync::Arc;

use msgrelay::backend::realtime::{BeaconPoller, ChangeBeacon};
use msgrelay::backend::store::{PgStore, Store, StoreBackend};
use msgrelay::shared::User;

async fn test_store() -> Option<PgStore> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping postgres test");
            return None;
        }
    };
    Some(PgStore::connect(&url).await.unwrap())
}

#[tokio::test]
async fn test_save_advances_marker_with_data() {
    let Some(backend) = test_store().await else {
        return;
    };
    let before = backend.current_marker().await.unwrap();
    let mut poller = BeaconPoller::with_baseline(before);

    let store = Store::new(Arc::new(backend.clone()));
    let user = store
        .update(|data| {
            let user = User::new(format!("pg-{}", uuid::Uuid::new_v4().simple()), "Postgres");
            data.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
        .unwrap();

    assert_eq!(backend.current_marker().await.unwrap(), before + 1);
    assert!(poller.poll(&backend).await);
    assert!(backend.load().await.unwrap().users.contains_key(&user.id));
}

#[tokio::test]
async fn test_two_pools_see_each_others_commits() {
    let (Some(first), Some(second)) = (test_store().await, test_store().await) else {
        return;
    };
    let mut poller = BeaconPoller::new();
    poller.poll(&second).await;

    first.advance().await.unwrap();
    assert!(poller.poll(&second).await);
}
