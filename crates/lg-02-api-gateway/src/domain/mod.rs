//! Domain layer for the API Gateway.
//!
//! Configuration, errors and the route table. No I/O.

pub mod config;
pub mod error;
pub mod routes;

pub use config::*;
pub use error::*;
pub use routes::{not_found_message, Route};
