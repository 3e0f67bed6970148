//! # Outbound Ports (Driven Ports)
//!
//! The append-only ledger the index is built from.

use crate::domain::LedgerRecord;
use async_trait::async_trait;
use shared_types::{TopicSet, TransactionEnvelope};
use thiserror::Error;

/// Abstract interface over an append-only ledger.
///
/// Heights are assigned by the ledger, start at 0, and are contiguous.
#[async_trait]
pub trait LedgerSource: Send + Sync + 'static {
    /// Cheap reachability check.
    async fn probe(&self) -> Result<(), SourceError>;

    /// Append a record; the ledger assigns its height.
    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LedgerRecord, SourceError>;

    /// Up to `limit` records starting at `height`, in height order.
    async fn read_from(&self, height: u64, limit: usize) -> Result<Vec<LedgerRecord>, SourceError>;

    /// Height the next appended record will receive.
    async fn head(&self) -> Result<u64, SourceError>;
}

/// Ledger operation errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The ledger cannot be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while reading or writing the ledger.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded.
    #[error("corrupt ledger record at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    /// A record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
