//! Dynalock Core - Distributed lock engine
//!
//! This crate provides:
//! - `DynamoLock`: a named lock handle with obtain/refresh/release over
//!   conditional writes
//! - `SchemaProvisioner`: lazy, idempotent table and TTL bootstrap
//! - `LeaseKeeper`: background refresh of a held lock
//! - Lock metrics

pub mod lease;
pub mod lock;
pub mod metrics;
pub mod provisioner;

pub use lock::{DynamoLock, KeeperExit, LeaseKeeper};
pub use provisioner::SchemaProvisioner;

// Re-export the pieces callers need to build a handle
pub use dynalock_common::{DynalockError, LockSettings, Result};
pub use dynalock_store::{LockStore, MemoryLockStore};

#[cfg(feature = "dynamodb")]
pub use dynalock_store::{DynamoDbLockStore, DynamoDbStoreConfig};
