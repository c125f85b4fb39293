//! Schema provisioning
//!
//! Makes sure the lock table exists with `LockName` as its hash key and that
//! the TTL sweep runs on `ExpirationTime`. Every step is idempotent, so any
//! number of handles and processes may provision concurrently. Failures are
//! logged and swallowed: provisioning never stands in the way of an obtain.

use tracing::{debug, info, warn};

use dynalock_common::{ATTR_EXPIRATION_TIME, ATTR_LOCK_NAME};
use dynalock_store::{LockStore, TableSpec, TtlStatus};

use crate::metrics::{self, ProvisionOutcome};

pub struct SchemaProvisioner<'a, S: LockStore + ?Sized> {
    store: &'a S,
    table_name: &'a str,
}

impl<'a, S: LockStore + ?Sized> SchemaProvisioner<'a, S> {
    pub fn new(store: &'a S, table_name: &'a str) -> Self {
        Self { store, table_name }
    }

    /// Create the lock table if it is missing.
    ///
    /// Returns true when the table is known to exist (found or just created).
    pub async fn ensure_table_exists(&self) -> bool {
        match self.store.describe_table(self.table_name).await {
            Ok(Some(description)) => {
                if description.partition_key.as_deref() != Some(ATTR_LOCK_NAME) {
                    warn!(
                        table = %self.table_name,
                        partition_key = ?description.partition_key,
                        "Lock table partition key is not {}",
                        ATTR_LOCK_NAME
                    );
                }
                true
            }
            Ok(None) => {
                let spec = TableSpec::lock_table(self.table_name);
                match self.store.create_table(&spec).await {
                    Ok(()) => {
                        info!(
                            table = %self.table_name,
                            backend = self.store.backend_name(),
                            "Created lock table"
                        );
                        true
                    }
                    Err(e) => {
                        warn!(table = %self.table_name, error = %e, "Failed to create lock table");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(table = %self.table_name, error = %e, "Failed to describe lock table");
                false
            }
        }
    }

    /// Turn on the TTL sweep for the expiration attribute.
    ///
    /// Returns true only when a describe confirms TTL is enabled. Issuing an
    /// update is not confirmation; the next call checks again.
    pub async fn ensure_ttl_enabled(&self) -> bool {
        let description = match self.store.describe_ttl(self.table_name).await {
            Ok(description) => description,
            Err(e) => {
                warn!(table = %self.table_name, error = %e, "Failed to describe lock table TTL");
                return false;
            }
        };

        match description.status {
            TtlStatus::Enabled => {
                if !description.is_enabled_on(ATTR_EXPIRATION_TIME) {
                    // A table has a single TTL attribute; leave the existing one alone
                    warn!(
                        table = %self.table_name,
                        attribute = ?description.attribute_name,
                        "TTL is enabled on another attribute, expired locks will not be swept"
                    );
                }
                true
            }
            TtlStatus::Enabling | TtlStatus::Disabling => {
                debug!(
                    table = %self.table_name,
                    status = ?description.status,
                    "TTL change in progress"
                );
                false
            }
            TtlStatus::Disabled => {
                match self
                    .store
                    .update_ttl(self.table_name, ATTR_EXPIRATION_TIME, true)
                    .await
                {
                    Ok(()) => info!(
                        table = %self.table_name,
                        attribute = ATTR_EXPIRATION_TIME,
                        "Requested TTL on lock table"
                    ),
                    Err(e) => warn!(
                        table = %self.table_name,
                        error = %e,
                        "Failed to enable TTL on lock table"
                    ),
                }
                false
            }
        }
    }

    /// Run both steps. Returns true when the handle may skip provisioning from now on.
    pub async fn run(&self) -> bool {
        if !self.ensure_table_exists().await {
            metrics::record_provision(ProvisionOutcome::Error);
            return false;
        }

        let confirmed = self.ensure_ttl_enabled().await;
        metrics::record_provision(if confirmed {
            ProvisionOutcome::Confirmed
        } else {
            ProvisionOutcome::Pending
        });
        confirmed
    }
}
