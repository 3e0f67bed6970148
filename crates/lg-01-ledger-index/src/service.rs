//! # Ledger Index Service
//!
//! [`LedgerIndex`] implementation over any [`LedgerSource`].
//!
//! ## INVARIANT-3: One Applier
//!
//! `catch_up` holds `apply_lock` while it reads from the ledger and applies
//! to the view, so the synchronization task and `append` never interleave
//! their applications. Readers only take the view's read lock.

use crate::domain::{IndexError, IndexStats, IndexView};
use crate::ports::{LedgerIndex, LedgerSource, SynchronizationHandle};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ChannelId, LocationId, StoredTransaction, Topic, TopicSet, TransactionEnvelope};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Background synchronization settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between catch-up passes.
    pub interval: Duration,
    /// Records fetched from the ledger per read.
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            batch_size: 512,
        }
    }
}

struct Inner<L> {
    source: L,
    view: RwLock<IndexView>,
    apply_lock: Mutex<()>,
    initialized: AtomicBool,
    sync_started: AtomicBool,
    config: SyncConfig,
}

impl<L: LedgerSource> Inner<L> {
    /// Apply every ledger record above the view's watermark.
    ///
    /// Returns the number of records applied.
    async fn catch_up(&self) -> Result<u64, IndexError> {
        let _guard = self.apply_lock.lock().await;
        let batch_size = self.config.batch_size.max(1);
        let mut applied = 0;

        loop {
            let from = self.view.read().next_height();
            let batch = self.source.read_from(from, batch_size).await?;
            let fetched = batch.len();

            {
                let mut view = self.view.write();
                for record in &batch {
                    if view.apply(record)? {
                        applied += 1;
                    }
                }
            }

            if fetched < batch_size {
                return Ok(applied);
            }
        }
    }

    /// One background pass. Skips the apply lock while the view is already
    /// at the ledger head.
    async fn synchronize(&self) -> Result<u64, IndexError> {
        let head = self.source.head().await?;
        if head <= self.view.read().next_height() {
            return Ok(0);
        }
        self.catch_up().await
    }

    fn ensure_initialized(&self) -> Result<(), IndexError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(IndexError::NotInitialized)
        }
    }
}

/// Ledger-backed index with a background catch-up loop.
pub struct LedgerIndexService<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for LedgerIndexService<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: LedgerSource> LedgerIndexService<L> {
    pub fn new(source: L, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                view: RwLock::new(IndexView::new()),
                apply_lock: Mutex::new(()),
                initialized: AtomicBool::new(false),
                sync_started: AtomicBool::new(false),
                config,
            }),
        }
    }

    pub fn source(&self) -> &L {
        &self.inner.source
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.view.read().stats()
    }

    /// Run one catch-up pass now instead of waiting for the next tick.
    pub async fn catch_up(&self) -> Result<u64, IndexError> {
        self.inner.ensure_initialized()?;
        self.inner.catch_up().await
    }
}

async fn run_synchronization<L: LedgerSource>(inner: Arc<Inner<L>>) {
    let period = inner.config.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match inner.synchronize().await {
            Ok(0) => {}
            Ok(applied) => debug!(applied, "Index view caught up with ledger"),
            Err(e) => warn!(error = %e, "Synchronization pass failed; retrying next interval"),
        }
    }
}

#[async_trait]
impl<L: LedgerSource> LedgerIndex for LedgerIndexService<L> {
    async fn initialize(&self) -> Result<(), IndexError> {
        if self.inner.initialized.load(Ordering::Acquire) {
            return Err(IndexError::AlreadyInitialized);
        }

        self.inner.source.probe().await?;
        let applied = self.inner.catch_up().await?;
        self.inner.initialized.store(true, Ordering::Release);

        let stats = self.stats();
        info!(
            applied,
            channels = stats.channels,
            topics = stats.topics,
            "Ledger index initialized"
        );
        Ok(())
    }

    async fn start_synchronization(&self) -> Result<SynchronizationHandle, IndexError> {
        self.inner.ensure_initialized()?;
        if self.inner.sync_started.swap(true, Ordering::AcqRel) {
            return Err(IndexError::SyncAlreadyStarted);
        }

        info!(
            interval_ms = self.inner.config.interval.as_millis() as u64,
            "Starting ledger synchronization"
        );
        let inner = Arc::clone(&self.inner);
        Ok(SynchronizationHandle::spawn(run_synchronization(inner)))
    }

    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LocationId, IndexError> {
        self.inner.ensure_initialized()?;
        envelope.validate()?;

        let record = self.inner.source.append(envelope, topics).await?;
        let location_id = record.location_id();

        // Read-your-writes: bring the view up to (at least) this record.
        // The record is durable either way; a failed pass is repaired by
        // the next synchronization tick.
        if let Err(e) = self.inner.catch_up().await {
            warn!(error = %e, location_id = %location_id, "View catch-up after append failed");
        }

        debug!(location_id = %location_id, channel_id = %record.channel_id(), "Transaction appended");
        Ok(location_id)
    }

    async fn read_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<StoredTransaction>, IndexError> {
        self.inner.ensure_initialized()?;
        Ok(self.inner.view.read().transactions(channel_id))
    }

    async fn read_by_topic(&self, topic: &Topic) -> Result<BTreeSet<ChannelId>, IndexError> {
        self.inner.ensure_initialized()?;
        Ok(self.inner.view.read().channels(topic))
    }
}
