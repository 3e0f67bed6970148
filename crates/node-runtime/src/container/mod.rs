//! # Node Container
//!
//! Configuration and construction of the ledger index the gateway serves.

pub mod config;
pub mod ledger;

pub use config::{ConfigError, LedgerBackend, LedgerConfig, NodeConfig, CONFIG_PATH_ENV};
pub use ledger::build_ledger_index;
