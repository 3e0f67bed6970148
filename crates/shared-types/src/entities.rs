//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identifiers**: `ChannelId`, `Topic`, `LocationId`
//! - **Transactions**: `TransactionEnvelope`, `StoredTransaction`
//! - **Lifecycle**: `NodeState`

use crate::errors::{EnvelopeError, IdentifierError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Upper bound on channel id and topic length, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 256;

// =============================================================================
// CLUSTER A: IDENTIFIERS
// =============================================================================

fn validate_identifier(kind: &'static str, raw: &str) -> Result<(), IdentifierError> {
    if raw.trim().is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    if raw.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong {
            kind,
            len: raw.len(),
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if raw.chars().any(|c| c.is_ascii_control()) {
        return Err(IdentifierError::ControlCharacter { kind });
    }
    Ok(())
}

/// Identifier of a channel: a logical grouping of related transactions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Validate and wrap a client-supplied channel id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate_identifier("channelId", &raw)?;
        Ok(Self(raw))
    }

    /// Channel opened by a transaction that did not name one.
    pub fn from_location(location: &LocationId) -> Self {
        Self(location.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag attached to a transaction at persist time, used for reverse lookup
/// of the channels that carry it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Validate and wrap a client-supplied topic.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate_identifier("topic", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deduplicated, ordered set of topics.
pub type TopicSet = BTreeSet<Topic>;

/// Opaque value identifying where a persisted transaction was stored.
///
/// Ledger-backed indexes render the ledger height as `0x` + 16 hex digits;
/// callers must not rely on that shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Location of the record at `height` in an append-only ledger.
    pub fn from_height(height: u64) -> Self {
        Self(format!("0x{:016x}", height))
    }

    /// Inverse of [`LocationId::from_height`].
    pub fn height(&self) -> Option<u64> {
        let hex = self.0.strip_prefix("0x")?;
        u64::from_str_radix(hex, 16).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Transaction as submitted by a client.
///
/// `data` is forwarded verbatim. `channel_id` optionally names the channel
/// the transaction belongs to; how an absent channel is resolved is up to the
/// backing index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
}

impl TransactionEnvelope {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            channel_id: None,
        }
    }

    pub fn with_channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    /// The only structural check the gateway performs on a payload.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.data.trim().is_empty() {
            return Err(EnvelopeError::EmptyData);
        }
        Ok(())
    }
}

/// A transaction as read back from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTransaction {
    pub location_id: LocationId,
    pub channel_id: ChannelId,
    pub data: String,
    pub topics: TopicSet,
}

// =============================================================================
// CLUSTER C: LIFECYCLE
// =============================================================================

/// Readiness state of the node.
///
/// ```text
/// Uninitialized ──▶ Initializing ──▶ Ready
///                        │
///                        └──────────▶ Failed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Whether `self -> next` is an edge of the lifecycle state machine.
    pub fn can_transition_to(self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Initializing)
                | (Self::Initializing, Self::Ready)
                | (Self::Initializing, Self::Failed)
        )
    }

    /// No transition leaves `Ready` or `Failed`.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
