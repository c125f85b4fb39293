//! Backing store capability contract
//!
//! A lock store is a key-value store with atomic single-item conditional
//! writes, table introspection/creation and TTL configuration. The lock engine
//! talks to the store only through this trait, so one client instance can be
//! shared by any number of lock handles.

use async_trait::async_trait;

use dynalock_common::Result;

use crate::condition::WriteCondition;
use crate::model::{LockItem, PutOutcome, TableDescription, TableSpec, TtlDescription};

#[async_trait]
pub trait LockStore: Send + Sync + 'static {
    /// Atomically write `item` if `condition` holds against the current record.
    ///
    /// Returns `PutOutcome::ConditionFailed` when the condition does not hold;
    /// errors are reserved for infrastructure failures.
    async fn put_conditional(
        &self,
        table: &str,
        item: &LockItem,
        condition: &WriteCondition,
    ) -> Result<PutOutcome>;

    /// Describe a table. Returns `None` if the table does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>>;

    /// Create a table.
    ///
    /// Creating a table that already exists (including one being created by a
    /// concurrent caller) succeeds.
    async fn create_table(&self, spec: &TableSpec) -> Result<()>;

    /// Describe the TTL sweep configuration of a table.
    async fn describe_ttl(&self, table: &str) -> Result<TtlDescription>;

    /// Enable or disable the TTL sweep on `attribute`.
    async fn update_ttl(&self, table: &str, attribute: &str, enabled: bool) -> Result<()>;

    /// Short backend name used in log fields
    fn backend_name(&self) -> &'static str;
}
