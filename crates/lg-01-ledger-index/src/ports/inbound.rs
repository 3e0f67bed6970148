//! # Inbound Ports (Driving Ports)
//!
//! The contract the gateway consumes: initialize, synchronize, read, write.

use crate::domain::IndexError;
use async_trait::async_trait;
use shared_types::{ChannelId, LocationId, StoredTransaction, Topic, TopicSet, TransactionEnvelope};
use std::collections::BTreeSet;
use std::future::Future;
use tokio::task::JoinHandle;

/// Primary API of the ledger index.
///
/// Every method may suspend. Implementations must be safe to share across
/// tasks behind an `Arc`.
#[async_trait]
pub trait LedgerIndex: Send + Sync {
    /// Bring the local view up to the current ledger head.
    ///
    /// ## Returns
    ///
    /// - `Ok(())`: the view reflects the ledger as of this call
    /// - `Err(AlreadyInitialized)`: called twice
    /// - `Err(Source)`: the ledger is unreachable or unreadable
    async fn initialize(&self) -> Result<(), IndexError>;

    /// Start the background task that keeps the view synchronized.
    ///
    /// The task runs for the life of the process. A second call fails with
    /// `SyncAlreadyStarted`.
    async fn start_synchronization(&self) -> Result<SynchronizationHandle, IndexError>;

    /// Append a transaction to the ledger and index it under `topics`.
    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LocationId, IndexError>;

    /// Transactions of a channel, in ledger order.
    async fn read_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<StoredTransaction>, IndexError>;

    /// Channels carrying a topic.
    async fn read_by_topic(&self, topic: &Topic) -> Result<BTreeSet<ChannelId>, IndexError>;
}

/// Handle to the background synchronization task.
///
/// Dropping the handle detaches the task; it is never aborted.
#[derive(Debug)]
pub struct SynchronizationHandle {
    task: JoinHandle<()>,
}

impl SynchronizationHandle {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Spawn `future` on the current runtime and wrap it.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::new(tokio::spawn(future))
    }

    /// `false` once the task has exited (it should not, short of a panic).
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handle_reports_liveness() {
        let running = SynchronizationHandle::spawn(std::future::pending());
        assert!(running.is_running());

        let finished = SynchronizationHandle::spawn(async {});
        for _ in 0..100 {
            if !finished.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!finished.is_running());
    }
}
