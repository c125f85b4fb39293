//! Integration tests for LeaseKeeper
//!
//! A kept lock stays out of reach of contenders until the keeper stops

use dynalock_core::{KeeperExit, LeaseKeeper};
use dynalock_integration_tests::{TABLE, init_tracing, lock, lock_with_lease, provisioned_store};
use dynalock_store::LockItem;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_kept_lock_blocks_contender() {
    init_tracing();
    let store = provisioned_store().await;
    let a = Arc::new(lock_with_lease(&store, "orion", Duration::from_secs(90)));
    let b = lock(&store, "orion");

    assert!(a.obtain().await);
    let keeper = LeaseKeeper::start(a.clone());
    assert_eq!(keeper.interval(), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert!(a.believes_held());
    assert!(!b.obtain().await);

    assert_eq!(keeper.stop().await, KeeperExit::Stopped);
    assert!(a.release().await);
    assert!(b.obtain().await);
}

#[tokio::test(start_paused = true)]
async fn test_keeper_gives_up_after_takeover() {
    init_tracing();
    let store = provisioned_store().await;
    let a = Arc::new(lock(&store, "orion"));
    assert!(a.obtain().await);

    let keeper = LeaseKeeper::start_with_interval(a.clone(), Duration::from_secs(10));
    store
        .insert_item(TABLE, LockItem::new("dynamo_lock_orion", "intruder", i64::MAX))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(!a.believes_held());
    assert_eq!(keeper.stop().await, KeeperExit::LostLock);
}

#[tokio::test(start_paused = true)]
async fn test_keeper_gives_up_when_store_fails() {
    init_tracing();
    let store = provisioned_store().await;
    let a = Arc::new(lock(&store, "orion"));
    assert!(a.obtain().await);

    let keeper = LeaseKeeper::start_with_interval(a.clone(), Duration::from_secs(10));
    store.set_unavailable(true);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(keeper.stop().await, KeeperExit::LostLock);
    assert!(!a.believes_held());
}
