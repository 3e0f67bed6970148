//! Process-local ledger.

use crate::domain::LedgerRecord;
use crate::ports::{LedgerSource, SourceError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{TopicSet, TransactionEnvelope};
use std::sync::atomic::{AtomicBool, Ordering};

/// Ledger held in memory. Lost on restart.
#[derive(Debug)]
pub struct InMemoryLedger {
    records: RwLock<Vec<LedgerRecord>>,
    reachable: AtomicBool,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Simulate the ledger process going away (or coming back).
    ///
    /// While unreachable every operation fails with `Unavailable`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn ensure_reachable(&self) -> Result<(), SourceError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::Unavailable("in-memory ledger marked unreachable".into()))
        }
    }
}

#[async_trait]
impl LedgerSource for InMemoryLedger {
    async fn probe(&self) -> Result<(), SourceError> {
        self.ensure_reachable()
    }

    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LedgerRecord, SourceError> {
        self.ensure_reachable()?;
        let mut records = self.records.write();
        let record = LedgerRecord {
            height: records.len() as u64,
            envelope,
            topics,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn read_from(&self, height: u64, limit: usize) -> Result<Vec<LedgerRecord>, SourceError> {
        self.ensure_reachable()?;
        let records = self.records.read();
        let start = usize::try_from(height).unwrap_or(usize::MAX).min(records.len());
        Ok(records[start..].iter().take(limit).cloned().collect())
    }

    async fn head(&self) -> Result<u64, SourceError> {
        self.ensure_reachable()?;
        Ok(self.records.read().len() as u64)
    }
}
