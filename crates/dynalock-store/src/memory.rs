//! In-memory lock store
//!
//! Implements the full capability contract inside the process. Each table lives
//! in one DashMap entry, and a conditional put holds that entry exclusively while
//! it evaluates the condition and writes, which gives the same single-item
//! atomicity a remote store provides.
//!
//! Besides tests, it is also useful for coordinating tasks of a single process.
//! It carries a few knobs for exercising failure paths: an `unavailable`
//! switch, per-table TTL status pins, and call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use dynalock_common::{ATTR_EXPIRATION_TIME, DynalockError, Result};

use crate::condition::WriteCondition;
use crate::model::{
    LockItem, PutOutcome, TableDescription, TableSpec, TableStatus, TtlDescription, TtlStatus,
};
use crate::traits::LockStore;

struct TableState {
    spec: TableSpec,
    ttl: TtlDescription,
    items: HashMap<String, LockItem>,
}

impl TableState {
    fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            ttl: TtlDescription::disabled(),
            items: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct CallCounters {
    put_conditional: AtomicU64,
    describe_table: AtomicU64,
    create_table: AtomicU64,
    describe_ttl: AtomicU64,
    update_ttl: AtomicU64,
}

/// Snapshot of how many times each store operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub put_conditional: u64,
    pub describe_table: u64,
    pub create_table: u64,
    pub describe_ttl: u64,
    pub update_ttl: u64,
}

impl CallCounts {
    /// Calls spent on table and TTL provisioning
    pub fn provisioning(&self) -> u64 {
        self.describe_table + self.create_table + self.describe_ttl + self.update_ttl
    }
}

#[derive(Default)]
pub struct MemoryLockStore {
    tables: DashMap<String, TableState>,
    ttl_pins: DashMap<String, TtlStatus>,
    counters: CallCounters,
    unavailable: AtomicBool,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `DynalockError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Report `status` from `describe_ttl` for `table` regardless of updates.
    ///
    /// Simulates a store whose TTL change has not taken effect yet.
    pub fn pin_ttl_status(&self, table: &str, status: TtlStatus) {
        self.ttl_pins.insert(table.to_string(), status);
    }

    pub fn unpin_ttl_status(&self, table: &str) {
        self.ttl_pins.remove(table);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            put_conditional: self.counters.put_conditional.load(Ordering::Relaxed),
            describe_table: self.counters.describe_table.load(Ordering::Relaxed),
            create_table: self.counters.create_table.load(Ordering::Relaxed),
            describe_ttl: self.counters.describe_ttl.load(Ordering::Relaxed),
            update_ttl: self.counters.update_ttl.load(Ordering::Relaxed),
        }
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Current record stored under `key`
    pub fn item(&self, table: &str, key: &str) -> Option<LockItem> {
        self.tables
            .get(table)
            .and_then(|state| state.items.get(key).cloned())
    }

    /// Write a record without any condition, bypassing the lock protocol.
    pub fn insert_item(&self, table: &str, item: LockItem) -> Result<()> {
        let mut state = self
            .tables
            .get_mut(table)
            .ok_or_else(|| DynalockError::TableNotFound(table.to_string()))?;
        state.items.insert(item.lock_name.clone(), item);
        Ok(())
    }

    /// Physically delete records whose TTL attribute is before `now`.
    ///
    /// Only tables with TTL enabled on the expiration attribute are swept.
    /// Returns the number of deleted records.
    pub fn sweep_expired(&self, now: i64) -> usize {
        let mut removed = 0;
        for mut state in self.tables.iter_mut() {
            if !state.ttl.is_enabled_on(ATTR_EXPIRATION_TIME) {
                continue;
            }
            let before = state.items.len();
            state.items.retain(|_, item| item.expiration_epoch >= now);
            removed += before - state.items.len();
        }

        if removed > 0 {
            debug!(count = removed, "Swept expired lock records");
        }
        removed
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DynalockError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn put_conditional(
        &self,
        table: &str,
        item: &LockItem,
        condition: &WriteCondition,
    ) -> Result<PutOutcome> {
        self.counters.put_conditional.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        let mut state = self
            .tables
            .get_mut(table)
            .ok_or_else(|| DynalockError::TableNotFound(table.to_string()))?;

        if !condition.is_satisfied_by(state.items.get(&item.lock_name)) {
            debug!(key = %item.lock_name, "Conditional put rejected");
            return Ok(PutOutcome::ConditionFailed);
        }

        state.items.insert(item.lock_name.clone(), item.clone());
        Ok(PutOutcome::Written)
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>> {
        self.counters.describe_table.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        Ok(self.tables.get(table).map(|state| TableDescription {
            table_name: state.spec.table_name.clone(),
            partition_key: Some(state.spec.partition_key.clone()),
            status: TableStatus::Active,
        }))
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<()> {
        self.counters.create_table.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        if spec.table_name.is_empty() || spec.partition_key.is_empty() {
            return Err(DynalockError::InvalidArgument(
                "table name and partition key must not be empty".to_string(),
            ));
        }

        self.tables
            .entry(spec.table_name.clone())
            .or_insert_with(|| TableState::new(spec.clone()));
        Ok(())
    }

    async fn describe_ttl(&self, table: &str) -> Result<TtlDescription> {
        self.counters.describe_ttl.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        let state = self
            .tables
            .get(table)
            .ok_or_else(|| DynalockError::TableNotFound(table.to_string()))?;

        let mut ttl = state.ttl.clone();
        if let Some(pinned) = self.ttl_pins.get(table) {
            ttl.status = *pinned;
        }
        Ok(ttl)
    }

    async fn update_ttl(&self, table: &str, attribute: &str, enabled: bool) -> Result<()> {
        self.counters.update_ttl.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        let mut state = self
            .tables
            .get_mut(table)
            .ok_or_else(|| DynalockError::TableNotFound(table.to_string()))?;

        state.ttl = if enabled {
            TtlDescription::enabled(attribute)
        } else {
            TtlDescription::disabled()
        };
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
