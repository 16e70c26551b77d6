//! Run lifecycle events.
//!
//! Events go out on a `tokio::sync::broadcast` channel. Subscribing is
//! optional; with no subscribers (or with one that stopped reading) emitting
//! is a no-op, so a slow UI can never stall the run loop.

use crate::run::RunStatus;
use stampede_types::ActorId;
use tokio::sync::broadcast;

/// Lifecycle notifications emitted by the behavior orchestrator.
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: u64,
        archetype: String,
        actor: ActorId,
        /// Requested steps; 0 for deadline-bound runs.
        iterations: u32,
    },
    Progress {
        run_id: u64,
        iteration: u32,
        succeeded: u32,
        failed: u32,
        skipped: u32,
    },
    RunCompleted {
        run_id: u64,
        status: RunStatus,
        succeeded: u32,
        failed: u32,
        skipped: u32,
    },
    RunFailed {
        run_id: u64,
        detail: String,
    },
}

/// Fan-out handle for [`RunEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<RunEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A fresh receiver seeing every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: RunEvent) {
        // Err here just means nobody is listening.
        let _ = self.sender.send(event);
    }
}
