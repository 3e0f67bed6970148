//! # Shared Types Crate
//!
//! Domain entities shared by every crate in the Ledger Gateway workspace.
//!
//! ## Design Principles
//!
//! - **Opaque payloads**: the gateway never looks inside a transaction's
//!   `data`; it validates only that one was supplied.
//! - **Validated identifiers**: `ChannelId` and `Topic` can only be built
//!   through [`ChannelId::parse`] / [`Topic::parse`] (or deserialization,
//!   which runs the same checks), so downstream code never sees an empty or
//!   oversized key.
//! - **One readiness state**: [`NodeState`] is the single vocabulary used by
//!   the lifecycle controller, the request gate and the runtime.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
