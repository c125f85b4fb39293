//! Shared helpers for the Dynalock integration tests

use std::sync::{Arc, Once};

use dynalock_common::LockSettings;
use dynalock_core::DynamoLock;
use dynalock_store::{LockStore, MemoryLockStore, TableSpec};
use tracing_subscriber::EnvFilter;

pub const TABLE: &str = "dynamo_locks";

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Memory store with the lock table created and TTL enabled
pub async fn provisioned_store() -> Arc<MemoryLockStore> {
    let store = Arc::new(MemoryLockStore::new());
    store
        .create_table(&TableSpec::lock_table(TABLE))
        .await
        .expect("create lock table");
    store
        .update_ttl(TABLE, dynalock_common::ATTR_EXPIRATION_TIME, true)
        .await
        .expect("enable TTL");
    store
}

/// Handle with default settings, independent of the process environment
pub fn lock<S: LockStore + ?Sized>(store: &Arc<S>, name: &str) -> DynamoLock<S> {
    DynamoLock::with_settings(store.clone(), name, LockSettings::default())
}

/// Handle with an explicit lease
pub fn lock_with_lease<S: LockStore + ?Sized>(
    store: &Arc<S>,
    name: &str,
    lease: std::time::Duration,
) -> DynamoLock<S> {
    DynamoLock::with_settings(
        store.clone(),
        name,
        LockSettings::default().with_lease(lease),
    )
}
