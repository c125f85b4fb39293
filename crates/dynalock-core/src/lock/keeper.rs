//! Background lease refresh
//!
//! A `LeaseKeeper` refreshes a shared handle on a fixed interval, one third of
//! the lease by default, so a long critical section does not outlive its
//! lease. It gives up on the first refresh that fails.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use dynalock_store::LockStore;

use super::DynamoLock;

/// Shortest refresh interval a keeper will use
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Why a keeper task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperExit {
    /// `stop()` was called
    Stopped,
    /// A refresh did not go through; the handle no longer believes it holds the lock
    LostLock,
    /// The task panicked or was cancelled
    Aborted,
}

pub struct LeaseKeeper {
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<KeeperExit>,
    interval: Duration,
}

impl LeaseKeeper {
    /// Start refreshing `lock` every third of its lease.
    pub fn start<S>(lock: Arc<DynamoLock<S>>) -> Self
    where
        S: LockStore + ?Sized,
    {
        let interval = lock.lease() / 3;
        Self::start_with_interval(lock, interval)
    }

    pub fn start_with_interval<S>(lock: Arc<DynamoLock<S>>, interval: Duration) -> Self
    where
        S: LockStore + ?Sized,
    {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let task = tokio::spawn(run(lock, interval, stop_rx));

        Self {
            stop_tx,
            task,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task has already exited on its own or been stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop refreshing and wait for the task to exit.
    ///
    /// Returns `LostLock` if the task had already given up.
    pub async fn stop(self) -> KeeperExit {
        // The receiver is gone if the task already exited
        let _ = self.stop_tx.send(()).await;

        match self.task.await {
            Ok(exit) => exit,
            Err(e) => {
                warn!(error = %e, "Lease keeper task did not finish cleanly");
                KeeperExit::Aborted
            }
        }
    }
}

async fn run<S>(
    lock: Arc<DynamoLock<S>>,
    period: Duration,
    mut stop_rx: mpsc::Receiver<()>,
) -> KeeperExit
where
    S: LockStore + ?Sized,
{
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !lock.refresh().await {
                    warn!(
                        lock = %lock.lock_name(),
                        holder = %lock.holder_id(),
                        "Lease keeper stopping, refresh failed"
                    );
                    return KeeperExit::LostLock;
                }
            }
            _ = stop_rx.recv() => {
                debug!(lock = %lock.lock_name(), "Lease keeper stopped");
                return KeeperExit::Stopped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dynalock_common::LockSettings;
    use dynalock_store::{LockItem, MemoryLockStore, TableSpec};

    use super::*;

    const TABLE: &str = "dynamo_locks";

    type HeldLock = (Arc<MemoryLockStore>, Arc<DynamoLock<MemoryLockStore>>);

    async fn held_lock(lease: Duration) -> HeldLock {
        let store = Arc::new(MemoryLockStore::new());
        store
            .create_table(&TableSpec::lock_table(TABLE))
            .await
            .unwrap();
        store.update_ttl(TABLE, "ExpirationTime", true).await.unwrap();

        let settings = LockSettings::default().with_lease(lease);
        let lock = Arc::new(DynamoLock::with_settings(store.clone(), "orion", settings));
        assert!(lock.obtain().await);
        (store, lock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_interval_is_third_of_lease() {
        let (_store, lock) = held_lock(Duration::from_secs(60)).await;
        let keeper = LeaseKeeper::start(lock);
        assert_eq!(keeper.interval(), Duration::from_secs(20));
        assert_eq!(keeper.stop().await, KeeperExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_has_a_floor() {
        let (_store, lock) = held_lock(Duration::ZERO).await;
        let keeper = LeaseKeeper::start(lock);
        assert_eq!(keeper.interval(), MIN_REFRESH_INTERVAL);
        assert_eq!(keeper.stop().await, KeeperExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_interval() {
        let (store, lock) = held_lock(Duration::from_secs(60)).await;
        let writes_after_obtain = store.calls().put_conditional;

        let keeper = LeaseKeeper::start(lock.clone());
        tokio::time::sleep(Duration::from_secs(45)).await;

        // Ticks at 20s and 40s
        assert_eq!(store.calls().put_conditional, writes_after_obtain + 2);
        assert!(lock.believes_held());
        assert_eq!(keeper.stop().await, KeeperExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_lock_is_lost() {
        let (store, lock) = held_lock(Duration::from_secs(60)).await;
        let keeper = LeaseKeeper::start(lock.clone());

        store
            .insert_item(TABLE, LockItem::new("dynamo_lock_orion", "someone-else", i64::MAX))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert!(keeper.is_finished());
        assert!(!lock.believes_held());
        assert_eq!(keeper.stop().await, KeeperExit::LostLock);
    }
}
