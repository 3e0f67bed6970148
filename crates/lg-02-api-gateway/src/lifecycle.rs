//! # Node Lifecycle
//!
//! Owns the node's readiness state and drives initialization of the ledger
//! index.
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──index ready + sync started──▶ Ready
//!                                      │
//!                                      └──either step fails──▶ Failed (terminal)
//! ```
//!
//! The state lives in a `watch` channel. Every transition is committed with
//! `send_if_modified`, which checks the edge against
//! [`NodeState::can_transition_to`] under the channel's lock, so readers
//! never see an illegal sequence and `initialize` can only run once.

use crate::middleware::GatewayMetrics;
use lg_01_ledger_index::{IndexError, LedgerIndex, SynchronizationHandle};
use parking_lot::Mutex;
use shared_types::NodeState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Fatal lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `initialize` was called after a previous call already moved the state
    #[error("node lifecycle already started (state: {state})")]
    AlreadyStarted { state: NodeState },

    /// The ledger index could not be initialized
    #[error("ledger index initialization failed: {0}")]
    Initialization(#[source] IndexError),

    /// Background synchronization could not be started
    #[error("ledger synchronization failed to start: {0}")]
    Synchronization(#[source] IndexError),
}

/// Drives the node from `Uninitialized` to `Ready` (or `Failed`).
pub struct LifecycleController {
    state: watch::Sender<NodeState>,
    index: Arc<dyn LedgerIndex>,
    warmup_delay: Duration,
    metrics: Arc<GatewayMetrics>,
    sync_handle: Mutex<Option<SynchronizationHandle>>,
    last_failure: Mutex<Option<String>>,
}

impl LifecycleController {
    pub fn new(
        index: Arc<dyn LedgerIndex>,
        warmup_delay: Duration,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let (state, _) = watch::channel(NodeState::Uninitialized);
        Self {
            state,
            index,
            warmup_delay,
            metrics,
            sync_handle: Mutex::new(None),
            last_failure: Mutex::new(None),
        }
    }

    /// Initialize the ledger index and start synchronization.
    ///
    /// Waits the warm-up delay first. Only the first call does anything;
    /// later calls fail with [`LifecycleError::AlreadyStarted`]. Any other
    /// error leaves the node `Failed` and should end the process.
    pub async fn initialize(&self) -> Result<(), LifecycleError> {
        self.transition(NodeState::Initializing)
            .map_err(|state| LifecycleError::AlreadyStarted { state })?;

        let started = Instant::now();
        let result = self.bring_up().await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        self.metrics.record_initialize(elapsed, result.is_ok());

        match result {
            Ok(handle) => {
                *self.sync_handle.lock() = Some(handle);
                self.commit(NodeState::Ready);
                info!(elapsed_ms, "Node initialized and ready");
                Ok(())
            }
            Err(e) => {
                *self.last_failure.lock() = Some(e.to_string());
                self.commit(NodeState::Failed);
                error!(error = %e, elapsed_ms, "Node initialization failed");
                Err(e)
            }
        }
    }

    async fn bring_up(&self) -> Result<SynchronizationHandle, LifecycleError> {
        if !self.warmup_delay.is_zero() {
            info!(
                delay_ms = self.warmup_delay.as_millis() as u64,
                "Waiting for ledger warm-up"
            );
            tokio::time::sleep(self.warmup_delay).await;
        }

        self.index
            .initialize()
            .await
            .map_err(LifecycleError::Initialization)?;

        self.index
            .start_synchronization()
            .await
            .map_err(LifecycleError::Synchronization)
    }

    /// Move to `next` if that is a legal edge from the current state.
    ///
    /// Returns the state that blocked the move on failure.
    fn transition(&self, next: NodeState) -> Result<(), NodeState> {
        let mut from = NodeState::Uninitialized;
        let moved = self.state.send_if_modified(|state| {
            from = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });

        if moved {
            info!(from = %from, to = %next, "Node state transition");
            Ok(())
        } else {
            Err(from)
        }
    }

    /// Transition out of `Initializing`. Only `initialize` holds that state,
    /// so this cannot be refused.
    fn commit(&self, next: NodeState) {
        if let Err(state) = self.transition(next) {
            warn!(from = %state, to = %next, "Refused lifecycle transition");
        }
    }

    /// Most recently committed state.
    pub fn current_state(&self) -> NodeState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.current_state() == NodeState::Ready
    }

    /// Receiver that observes every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<NodeState> {
        self.state.subscribe()
    }

    /// Message of the error that moved the node to `Failed`.
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().clone()
    }

    /// Whether the background synchronization task is alive.
    ///
    /// Reported for observability only; it does not affect readiness.
    pub fn synchronization_running(&self) -> bool {
        self.sync_handle
            .lock()
            .as_ref()
            .map(SynchronizationHandle::is_running)
            .unwrap_or(false)
    }
}
