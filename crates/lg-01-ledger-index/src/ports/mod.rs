//! # Ports Layer
//!
//! Hexagonal architecture ports (interfaces) for the ledger index.
//!
//! - **Driving Ports (Inbound)**: `LedgerIndex`, consumed by the API gateway
//!   and the lifecycle controller
//! - **Driven Ports (Outbound)**: `LedgerSource`, implemented by ledger adapters

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
