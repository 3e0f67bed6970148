//! # Ledger Index (lg-01)
//!
//! The ledger index is the gateway's backing store. Transactions are appended
//! to an append-only ledger; a local view indexes them by channel and by
//! topic and is kept in step with the ledger by a background task.
//!
//! ## Flow
//!
//! ```text
//! append(envelope, topics) ──▶ LedgerSource (append-only) ──▶ height
//!                                      │
//!                                      ↓  catch_up()
//!                               IndexView
//!                     channel ──▶ [StoredTransaction, ...]   (ledger order)
//!                     topic   ──▶ {ChannelId, ...}
//!                                      ↑
//!       read_by_channel / read_by_topic┘
//! ```
//!
//! ## Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | INVARIANT-1 | View heights are contiguous from 0 | `IndexView::apply` |
//! | INVARIANT-2 | Records are applied exactly once | `IndexView::apply` skips heights below the watermark |
//! | INVARIANT-3 | One applier at a time | `apply_lock` in `LedgerIndexService` |
//! | INVARIANT-4 | At most one synchronization task | `start_synchronization` guard |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): ledger records and the index view, no I/O
//! - **Ports Layer** (`ports/`): `LedgerIndex` (inbound), `LedgerSource` (outbound)
//! - **Adapters Layer** (`adapters/`): in-memory and JSON-lines file ledgers
//! - **Service** (`service`): `LedgerIndexService`, the `LedgerIndex` implementation

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileLedger, InMemoryLedger};
pub use domain::{IndexError, IndexStats, IndexView, LedgerRecord};
pub use ports::{LedgerIndex, LedgerSource, SourceError, SynchronizationHandle};
pub use service::{LedgerIndexService, SyncConfig};
