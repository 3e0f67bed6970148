//! # Adapters Layer
//!
//! `LedgerSource` implementations.

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::InMemoryLedger;
