//! Dynalock Common - Shared types, settings, and utilities
//!
//! This crate provides the foundational pieces used across all Dynalock components:
//! - Error type and result alias
//! - Lock settings (table name, key prefix, lease duration)
//! - Wire attribute names for the lock record
//! - Time helpers

pub mod error;
pub mod settings;
pub mod utils;

// Re-exports for convenience
pub use error::{DynalockError, Result};
pub use settings::{LockSettings, lease_from_override_ms};
pub use utils::current_epoch_seconds;

/// Default table holding every lock record
pub const DEFAULT_TABLE_NAME: &str = "dynamo_locks";

/// Prefix prepended to a lock name to form the record key
pub const DEFAULT_KEY_PREFIX: &str = "dynamo_lock_";

/// Default lease duration in minutes
pub const DEFAULT_LEASE_MINUTES: u64 = 60;

/// Partition key attribute of the lock record
pub const ATTR_LOCK_NAME: &str = "LockName";

/// Attribute holding the current holder identifier (empty when unheld)
pub const ATTR_HOLDER_IDENTIFIER: &str = "HolderIdentifier";

/// Attribute holding the lease expiration in Unix seconds; also the TTL attribute
pub const ATTR_EXPIRATION_TIME: &str = "ExpirationTime";

/// Environment prefix for settings overrides
pub const ENV_PREFIX: &str = "DYNAMO_LOCK";

/// Settings key for the lease override in milliseconds
/// (`DYNAMO_LOCK_OVERRIDE_EXPIRATION_TIME` in the environment)
pub const OVERRIDE_EXPIRATION_TIME_KEY: &str = "override_expiration_time";

/// Settings key for the table name (`DYNAMO_LOCK_TABLE_NAME`)
pub const TABLE_NAME_KEY: &str = "table_name";

/// Settings key for the record key prefix (`DYNAMO_LOCK_KEY_PREFIX`)
pub const KEY_PREFIX_KEY: &str = "key_prefix";
