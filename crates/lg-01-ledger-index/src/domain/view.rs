//! # Index View
//!
//! The local, queryable view of the ledger.
//!
//! ## INVARIANT-1: Contiguous Heights
//!
//! `next_height` is a watermark: every record below it has been applied, no
//! record at or above it has. A record above the watermark is a gap and is
//! rejected rather than applied out of order.
//!
//! ## INVARIANT-2: Exactly-Once Application
//!
//! Records below the watermark are skipped, so replaying an overlapping
//! range of the ledger is harmless.

use crate::domain::errors::IndexError;
use serde::{Deserialize, Serialize};
use shared_types::{
    ChannelId, LocationId, StoredTransaction, Topic, TopicSet, TransactionEnvelope,
};
use std::collections::{BTreeSet, HashMap};

/// One entry of the append-only ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub height: u64,
    pub envelope: TransactionEnvelope,
    pub topics: TopicSet,
}

impl LedgerRecord {
    pub fn location_id(&self) -> LocationId {
        LocationId::from_height(self.height)
    }

    /// The channel this record belongs to: the one its envelope names, or a
    /// fresh channel named after its own location.
    pub fn channel_id(&self) -> ChannelId {
        match &self.envelope.channel_id {
            Some(channel_id) => channel_id.clone(),
            None => ChannelId::from_location(&self.location_id()),
        }
    }
}

/// Summary counters of an [`IndexView`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of ledger records applied to the view.
    pub applied: u64,
    pub channels: usize,
    pub topics: usize,
}

/// Channel and topic indexes over a prefix of the ledger.
#[derive(Debug, Default)]
pub struct IndexView {
    next_height: u64,
    channels: HashMap<ChannelId, Vec<StoredTransaction>>,
    topics: HashMap<Topic, BTreeSet<ChannelId>>,
}

impl IndexView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the next record this view expects.
    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    /// Apply one record.
    ///
    /// Returns `Ok(false)` when the record was already applied.
    pub fn apply(&mut self, record: &LedgerRecord) -> Result<bool, IndexError> {
        if record.height < self.next_height {
            return Ok(false);
        }
        if record.height > self.next_height {
            return Err(IndexError::Gap {
                expected: self.next_height,
                found: record.height,
            });
        }

        let channel_id = record.channel_id();
        for topic in &record.topics {
            self.topics
                .entry(topic.clone())
                .or_default()
                .insert(channel_id.clone());
        }
        self.channels
            .entry(channel_id.clone())
            .or_default()
            .push(StoredTransaction {
                location_id: record.location_id(),
                channel_id,
                data: record.envelope.data.clone(),
                topics: record.topics.clone(),
            });

        self.next_height += 1;
        Ok(true)
    }

    /// Transactions of a channel in ledger order; empty for an unknown channel.
    pub fn transactions(&self, channel_id: &ChannelId) -> Vec<StoredTransaction> {
        self.channels.get(channel_id).cloned().unwrap_or_default()
    }

    /// Channels that carry `topic`; empty for an unknown topic.
    pub fn channels(&self, topic: &Topic) -> BTreeSet<ChannelId> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            applied: self.next_height,
            channels: self.channels.len(),
            topics: self.topics.len(),
        }
    }
}
