//! Ledger index construction for the configured backend.

use super::config::{LedgerBackend, LedgerConfig};
use lg_01_ledger_index::{
    FileLedger, InMemoryLedger, LedgerIndex, LedgerIndexService, SourceError,
};
use std::sync::Arc;
use tracing::info;

/// Build the index over the configured ledger.
///
/// The index is not initialized here; the lifecycle controller does that
/// after the listeners are up.
pub async fn build_ledger_index(config: &LedgerConfig) -> Result<Arc<dyn LedgerIndex>, SourceError> {
    let sync = config.sync_config();
    let index: Arc<dyn LedgerIndex> = match config.backend {
        LedgerBackend::Memory => {
            info!("Using in-memory ledger");
            Arc::new(LedgerIndexService::new(InMemoryLedger::new(), sync))
        }
        LedgerBackend::File => {
            info!(path = %config.path.display(), "Using file ledger");
            let ledger = FileLedger::open(&config.path).await?;
            Arc::new(LedgerIndexService::new(ledger, sync))
        }
    };
    Ok(index)
}
