//! Integration tests for the obtain/refresh/release protocol
//!
//! Two handles on the same lock name compete through one shared store

use dynalock_common::current_epoch_seconds;
use dynalock_core::MemoryLockStore;
use dynalock_integration_tests::{TABLE, init_tracing, lock, provisioned_store};
use dynalock_store::LockItem;
use std::sync::Arc;

const KEY: &str = "dynamo_lock_orion";

#[tokio::test]
async fn test_two_locks_fighting() {
    init_tracing();
    let store = provisioned_store().await;
    let a = lock(&store, "orion");
    let b = lock(&store, "orion");

    // A wins, B is shut out
    assert!(a.obtain().await);
    assert!(!b.obtain().await);

    // A hands over
    assert!(a.release().await);
    assert!(b.obtain().await);

    // Now A is shut out
    assert!(!a.obtain().await);
    assert!(b.believes_held());
    assert!(!a.believes_held());
}

#[tokio::test]
async fn test_refresh_keeps_contender_out() {
    init_tracing();
    let store = provisioned_store().await;
    let a = lock(&store, "orion");
    let b = lock(&store, "orion");

    assert!(a.obtain().await);
    let near_expiry = LockItem::new(KEY, a.holder_id(), current_epoch_seconds() + 1);
    store.insert_item(TABLE, near_expiry).unwrap();

    assert!(a.refresh().await);
    let item = store.item(TABLE, KEY).unwrap();
    assert!(item.expiration_epoch > current_epoch_seconds() + 50 * 60);
    assert!(!b.obtain().await);
}

#[tokio::test]
async fn test_release_by_non_holder_is_rejected() {
    init_tracing();
    let store = provisioned_store().await;
    let a = lock(&store, "orion");
    let b = lock(&store, "orion");

    assert!(b.obtain().await);
    let held = store.item(TABLE, KEY).unwrap();

    assert!(!a.release().await);
    assert!(!a.refresh().await);
    assert_eq!(store.item(TABLE, KEY).unwrap(), held);

    // B is unaffected
    assert!(b.refresh().await);
    assert!(b.release().await);
}

#[tokio::test]
async fn test_release_on_fresh_name() {
    init_tracing();
    let store = provisioned_store().await;
    let a = lock(&store, "never-obtained");

    assert!(!a.release().await);
    assert!(store.item(TABLE, "dynamo_lock_never-obtained").is_none());
}

#[tokio::test]
async fn test_distinct_names_do_not_contend() {
    init_tracing();
    let store = provisioned_store().await;
    let orion = lock(&store, "orion");
    let vega = lock(&store, "vega");

    assert!(orion.obtain().await);
    assert!(vega.obtain().await);
    assert!(store.item(TABLE, "dynamo_lock_orion").is_some());
    assert!(store.item(TABLE, "dynamo_lock_vega").is_some());
}

#[tokio::test]
async fn test_first_obtain_bootstraps_schema() {
    init_tracing();
    let store = Arc::new(MemoryLockStore::new());
    let a = lock(&store, "orion");

    assert!(a.obtain().await);
    assert!(store.table_exists(TABLE));

    // TTL was requested on the first pass and confirmed on the second
    assert!(a.obtain().await);
    let calls = store.calls();
    assert_eq!(calls.create_table, 1);
    assert_eq!(calls.update_ttl, 1);
    assert_eq!(calls.describe_ttl, 2);

    a.obtain().await;
    a.obtain().await;
    assert_eq!(store.calls().provisioning(), calls.provisioning());
}
