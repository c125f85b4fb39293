//! Lock record and table models shared by every store implementation

use serde::{Deserialize, Serialize};

use dynalock_common::ATTR_LOCK_NAME;

/// One lock record, keyed by its lock name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockItem {
    /// Partition key (already prefixed, e.g. `dynamo_lock_orion`)
    #[serde(rename = "LockName")]
    pub lock_name: String,
    /// Current holder; empty when the lock is unheld
    #[serde(rename = "HolderIdentifier", default)]
    pub holder_identifier: String,
    /// Lease expiration in Unix seconds
    #[serde(rename = "ExpirationTime")]
    pub expiration_epoch: i64,
}

impl LockItem {
    pub fn new(
        lock_name: impl Into<String>,
        holder_identifier: impl Into<String>,
        expiration_epoch: i64,
    ) -> Self {
        Self {
            lock_name: lock_name.into(),
            holder_identifier: holder_identifier.into(),
            expiration_epoch,
        }
    }

    /// Whether nobody holds this record
    pub fn is_unheld(&self) -> bool {
        self.holder_identifier.is_empty()
    }

    /// Whether the lease is logically over at `now` (Unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expiration_epoch
    }
}

/// Outcome of a conditional put.
///
/// A failed condition is a normal result (lock contention), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The condition held and the item was written
    Written,
    /// The condition did not hold; nothing was written
    ConditionFailed,
}

impl PutOutcome {
    pub fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Definition of the lock table: a single string hash key, on-demand capacity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table_name: String,
    pub partition_key: String,
}

impl TableSpec {
    /// The lock table layout keyed by `LockName`
    pub fn lock_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: ATTR_LOCK_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Unknown,
}

/// What a store reports about an existing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub partition_key: Option<String>,
    pub status: TableStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    Enabled,
    Enabling,
    Disabled,
    Disabling,
}

/// TTL sweep configuration of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlDescription {
    pub status: TtlStatus,
    pub attribute_name: Option<String>,
}

impl TtlDescription {
    pub fn disabled() -> Self {
        Self {
            status: TtlStatus::Disabled,
            attribute_name: None,
        }
    }

    pub fn enabled(attribute_name: impl Into<String>) -> Self {
        Self {
            status: TtlStatus::Enabled,
            attribute_name: Some(attribute_name.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == TtlStatus::Enabled
    }

    /// Whether the sweep is enabled on exactly `attribute`
    pub fn is_enabled_on(&self, attribute: &str) -> bool {
        self.is_enabled() && self.attribute_name.as_deref() == Some(attribute)
    }
}
