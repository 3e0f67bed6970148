//! # Domain Errors
//!
//! Error types for the ledger index.

use crate::ports::SourceError;
use shared_types::EnvelopeError;
use thiserror::Error;

/// Errors returned by [`crate::LedgerIndex`] operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A read or write arrived before `initialize()` completed.
    #[error("index is not initialized")]
    NotInitialized,

    /// `initialize()` was called twice.
    #[error("index is already initialized")]
    AlreadyInitialized,

    /// `start_synchronization()` was called twice.
    #[error("synchronization already started")]
    SyncAlreadyStarted,

    /// The ledger returned a record out of sequence.
    #[error("ledger gap: expected height {expected}, found {found}")]
    Gap { expected: u64, found: u64 },

    /// The envelope failed validation.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(#[from] EnvelopeError),

    /// The backing ledger failed.
    #[error("ledger error: {0}")]
    Source(#[from] SourceError),
}
