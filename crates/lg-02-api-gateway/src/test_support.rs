//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use axum::response::Response;
use lg_01_ledger_index::{IndexError, LedgerIndex, SourceError, SynchronizationHandle};
use parking_lot::Mutex;
use shared_types::{
    ChannelId, LocationId, StoredTransaction, Topic, TopicSet, TransactionEnvelope,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-process `LedgerIndex` that records every call.
///
/// `calls()` counts append/read calls only; initialize and synchronization
/// are lifecycle plumbing.
#[derive(Default)]
pub struct StubIndex {
    fail_initialize: bool,
    failing: AtomicBool,
    calls: AtomicUsize,
    appended: Mutex<Vec<(TransactionEnvelope, TopicSet)>>,
    channel_reads: Mutex<Vec<ChannelId>>,
    stored: Mutex<Vec<StoredTransaction>>,
    topics: Mutex<BTreeMap<Topic, BTreeSet<ChannelId>>>,
}

impl StubIndex {
    /// Index whose `initialize` fails.
    pub fn failing() -> Self {
        Self {
            fail_initialize: true,
            ..Self::default()
        }
    }

    /// Make append and reads fail from now on.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn appended(&self) -> Vec<(TransactionEnvelope, TopicSet)> {
        self.appended.lock().clone()
    }

    pub fn channel_reads(&self) -> Vec<ChannelId> {
        self.channel_reads.lock().clone()
    }

    fn enter(&self) -> Result<(), IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::Source(SourceError::Unavailable(
                "stub ledger offline".into(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerIndex for StubIndex {
    async fn initialize(&self) -> Result<(), IndexError> {
        if self.fail_initialize {
            return Err(IndexError::Source(SourceError::Unavailable(
                "stub ledger unreachable".into(),
            )));
        }
        Ok(())
    }

    async fn start_synchronization(&self) -> Result<SynchronizationHandle, IndexError> {
        Ok(SynchronizationHandle::spawn(std::future::pending()))
    }

    async fn append(
        &self,
        envelope: TransactionEnvelope,
        topics: TopicSet,
    ) -> Result<LocationId, IndexError> {
        self.enter()?;
        let mut appended = self.appended.lock();
        let location_id = LocationId::from_height(appended.len() as u64);
        let channel_id = envelope
            .channel_id
            .clone()
            .unwrap_or_else(|| ChannelId::from_location(&location_id));

        let mut index = self.topics.lock();
        for topic in &topics {
            index.entry(topic.clone()).or_default().insert(channel_id.clone());
        }
        self.stored.lock().push(StoredTransaction {
            location_id: location_id.clone(),
            channel_id,
            data: envelope.data.clone(),
            topics: topics.clone(),
        });
        appended.push((envelope, topics));
        Ok(location_id)
    }

    async fn read_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<StoredTransaction>, IndexError> {
        self.enter()?;
        self.channel_reads.lock().push(channel_id.clone());
        Ok(self
            .stored
            .lock()
            .iter()
            .filter(|t| &t.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn read_by_topic(&self, topic: &Topic) -> Result<BTreeSet<ChannelId>, IndexError> {
        self.enter()?;
        Ok(self.topics.lock().get(topic).cloned().unwrap_or_default())
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
