//! # Domain Layer
//!
//! Ledger records and the local index view built from them.
//!
//! This module contains NO I/O dependencies. All external interactions
//! are abstracted through ports in the `ports` module.

pub mod errors;
pub mod view;

pub use errors::*;
pub use view::*;
