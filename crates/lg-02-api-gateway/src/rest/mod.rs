//! REST handlers.

pub mod probes;
pub mod transactions;

pub use probes::{healthz, readyz};
pub use transactions::{
    channels_by_topic, persist_transaction, transactions_by_channel, PersistRequest,
    PersistResponse,
};
