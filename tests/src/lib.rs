//! # Ledger Gateway Test Suite
//!
//! Cross-crate flows that unit tests cannot cover on their own: the gateway
//! router and lifecycle controller driven against real ledger indexes.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── gateway_flows.rs   # Router + lifecycle + in-memory ledger
//!     ├── file_ledger.rs     # Persistence across restarts (tempfile)
//!     └── node_flows.rs      # NodeRuntime over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lg-tests
//!
//! # By flow
//! cargo test -p lg-tests integration::gateway_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
