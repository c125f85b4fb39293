//! Lock handle
//!
//! A `DynamoLock` names one lock record and carries a holder identifier that
//! is unique to the handle. All arbitration happens in the store's conditional
//! write; `believes_held` only remembers the outcome of this handle's last
//! completed write.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dynalock_common::{LockSettings, current_epoch_seconds};
use dynalock_store::{LockItem, LockStore, PutOutcome, WriteCondition};

use crate::lease::{expiration_after, format_expiration, next_expiration};
use crate::metrics::{self, WriteOutcome};
use crate::provisioner::SchemaProvisioner;

pub struct DynamoLock<S: LockStore + ?Sized = dyn LockStore> {
    store: Arc<S>,
    settings: LockSettings,
    lock_name: String,
    record_key: String,
    holder_id: String,
    believes_held: AtomicBool,
    provisioned: AtomicBool,
}

impl<S: LockStore + ?Sized> DynamoLock<S> {
    /// Create a handle for `lock_name` with settings from the environment.
    pub fn new(store: Arc<S>, lock_name: impl Into<String>) -> Self {
        Self::with_settings(store, lock_name, LockSettings::from_env())
    }

    pub fn with_settings(
        store: Arc<S>,
        lock_name: impl Into<String>,
        settings: LockSettings,
    ) -> Self {
        let lock_name = lock_name.into();
        let record_key = settings.record_key(&lock_name);

        Self {
            store,
            settings,
            lock_name,
            record_key,
            holder_id: Uuid::new_v4().to_string(),
            believes_held: AtomicBool::new(false),
            provisioned: AtomicBool::new(false),
        }
    }

    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }

    /// Identifier written into the record while this handle holds the lock
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    /// Key of the lock record in the store
    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    pub fn table_name(&self) -> &str {
        &self.settings.table_name
    }

    pub fn lease(&self) -> Duration {
        self.settings.lease
    }

    /// Outcome of the last completed write by this handle.
    ///
    /// Advisory only: the lease may have lapsed, or been taken over, since.
    pub fn believes_held(&self) -> bool {
        self.believes_held.load(Ordering::Acquire)
    }

    /// Try to take the lock.
    ///
    /// Succeeds when the record is absent, unheld, already held by this handle,
    /// or its lease is over. Obtaining again while held extends the lease.
    /// Returns false on contention and on store failure; never errors.
    pub async fn obtain(&self) -> bool {
        self.provision_once().await;

        let now = current_epoch_seconds();
        let expiration = expiration_after(now, self.settings.lease);
        let item = LockItem::new(&self.record_key, &self.holder_id, expiration);

        match self
            .store
            .put_conditional(
                &self.settings.table_name,
                &item,
                &WriteCondition::claimable(now, &self.holder_id),
            )
            .await
        {
            Ok(PutOutcome::Written) => {
                self.believes_held.store(true, Ordering::Release);
                metrics::record_obtain(WriteOutcome::Success);
                info!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    expires_at = %format_expiration(expiration),
                    "Lock obtained"
                );
                true
            }
            Ok(PutOutcome::ConditionFailed) => {
                self.believes_held.store(false, Ordering::Release);
                metrics::record_obtain(WriteOutcome::Contended);
                debug!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    "Lock held by another holder"
                );
                false
            }
            Err(e) => {
                self.believes_held.store(false, Ordering::Release);
                metrics::record_obtain(WriteOutcome::Error);
                error!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    error = %e,
                    "Failed to obtain lock"
                );
                false
            }
        }
    }

    /// Extend the lease of a lock this handle holds.
    pub async fn refresh(&self) -> bool {
        let expiration = next_expiration(self.settings.lease);
        let item = LockItem::new(&self.record_key, &self.holder_id, expiration);

        match self.write_if_held(&item).await {
            Ok(PutOutcome::Written) => {
                self.believes_held.store(true, Ordering::Release);
                metrics::record_refresh(WriteOutcome::Success);
                debug!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    expires_at = %format_expiration(expiration),
                    "Lock refreshed"
                );
                true
            }
            Ok(PutOutcome::ConditionFailed) => {
                self.believes_held.store(false, Ordering::Release);
                metrics::record_refresh(WriteOutcome::Contended);
                warn!(lock = %self.lock_name, holder = %self.holder_id, "Lock lost before refresh");
                false
            }
            Err(e) => {
                self.believes_held.store(false, Ordering::Release);
                metrics::record_refresh(WriteOutcome::Error);
                error!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    error = %e,
                    "Failed to refresh lock"
                );
                false
            }
        }
    }

    /// Give the lock up so another holder can take it immediately.
    ///
    /// `believes_held` is only cleared when the release is written.
    pub async fn release(&self) -> bool {
        let expiration = next_expiration(self.settings.lease);
        let item = LockItem::new(&self.record_key, "", expiration);

        match self.write_if_held(&item).await {
            Ok(PutOutcome::Written) => {
                self.believes_held.store(false, Ordering::Release);
                metrics::record_release(WriteOutcome::Success);
                info!(lock = %self.lock_name, holder = %self.holder_id, "Lock released");
                true
            }
            Ok(PutOutcome::ConditionFailed) => {
                metrics::record_release(WriteOutcome::Contended);
                debug!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    "Release skipped, lock not held"
                );
                false
            }
            Err(e) => {
                metrics::record_release(WriteOutcome::Error);
                error!(
                    lock = %self.lock_name,
                    holder = %self.holder_id,
                    error = %e,
                    "Failed to release lock"
                );
                false
            }
        }
    }

    async fn write_if_held(&self, item: &LockItem) -> dynalock_common::Result<PutOutcome> {
        self.store
            .put_conditional(
                &self.settings.table_name,
                item,
                &WriteCondition::held_by(&self.holder_id),
            )
            .await
    }

    async fn provision_once(&self) {
        if self.provisioned.load(Ordering::Acquire) {
            return;
        }

        let provisioner = SchemaProvisioner::new(self.store.as_ref(), &self.settings.table_name);
        if provisioner.run().await {
            self.provisioned.store(true, Ordering::Release);
        }
    }
}

impl<S: LockStore + ?Sized> fmt::Debug for DynamoLock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoLock")
            .field("lock_name", &self.lock_name)
            .field("holder_id", &self.holder_id)
            .field("table_name", &self.settings.table_name)
            .field("backend", &self.store.backend_name())
            .field("believes_held", &self.believes_held())
            .finish_non_exhaustive()
    }
}
