//! # Error Types
//!
//! Validation errors for client-supplied domain values.

use thiserror::Error;

/// Rejected channel id or topic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Empty, or whitespace only.
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    /// Longer than [`crate::MAX_IDENTIFIER_LEN`] bytes.
    #[error("{kind} exceeds {max} bytes (got {len})")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    /// Contains an ASCII control character.
    #[error("{kind} contains control characters")]
    ControlCharacter { kind: &'static str },
}

/// Rejected transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The opaque payload is missing or empty.
    #[error("transaction data must not be empty")]
    EmptyData,
}
