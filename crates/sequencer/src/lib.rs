//! Per-actor sequence (nonce) coordination.
//!
//! Every call that mutates an actor's state on a target network must carry a
//! monotonic sequence value with no gaps and no collisions, or the target
//! rejects it. Actors run as free-running concurrent tasks, so the
//! coordinator serializes slot assignment per `(actor, network)` key while
//! leaving unrelated keys fully parallel.
//!
//! The locking discipline is an explicit FIFO queue: `acquire` either takes
//! the key's lock immediately or parks on a oneshot channel; `release`
//! advances the counter and hands the lock to the oldest waiter. Nothing
//! relies on runtime wake ordering.

use parking_lot::Mutex;
use stampede_types::{ErrorKind, NetworkId, SequenceKey};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Errors from the coordinator's resync path.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("authoritative sequence read failed for {address}: {reason}")]
    ReaderUnavailable { address: String, reason: String },
}

/// Read-only view of on-chain account state, used only to resynchronize a
/// counter after the target reports a sequence mismatch.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// The next sequence value the network expects for `address`.
    async fn authoritative_sequence(
        &self,
        network: NetworkId,
        address: &str,
    ) -> Result<u64, SequenceError>;
}

/// Point-in-time view of one key's state, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSnapshot {
    pub current: u64,
    pub locked: bool,
    pub waiting: usize,
}

#[derive(Default)]
struct SequenceState {
    current: u64,
    locked: bool,
    /// Set when a resync replaced `current` while a holder was active; the
    /// matching release must not increment on top of the fresh value.
    resynced_during_hold: bool,
    waiters: VecDeque<oneshot::Sender<u64>>,
    last_sync: Option<Instant>,
}

/// Default cooldown between authoritative resyncs of one key.
pub const DEFAULT_RESYNC_COOLDOWN: Duration = Duration::from_secs(5);

/// Coordinates gap-free, collision-free sequence assignment per key.
///
/// Shared via `Arc` across every actor task in a run. The interior mutex
/// guards only short map operations and is never held across an await.
pub struct SequenceCoordinator<R> {
    entries: Mutex<HashMap<SequenceKey, SequenceState>>,
    reader: R,
    resync_cooldown: Duration,
}

impl<R: ChainReader> SequenceCoordinator<R> {
    pub fn new(reader: R) -> Self {
        Self::with_cooldown(reader, DEFAULT_RESYNC_COOLDOWN)
    }

    pub fn with_cooldown(reader: R, resync_cooldown: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            reader,
            resync_cooldown,
        }
    }

    /// Take the key's slot, waiting FIFO behind the current holder.
    ///
    /// Returns the sequence value to submit with. The caller owns the key
    /// until it calls [`release`](Self::release); every exit path of the
    /// caller must release, or all later acquires on the key stall.
    pub async fn acquire(&self, key: SequenceKey) -> u64 {
        loop {
            let receiver = {
                let mut entries = self.entries.lock();
                let state = entries.entry(key).or_default();
                if !state.locked {
                    state.locked = true;
                    trace!(key = %key, sequence = state.current, "Acquired sequence slot");
                    return state.current;
                }
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                trace!(key = %key, queue = state.waiters.len(), "Waiting for sequence slot");
                rx
            };

            match receiver.await {
                Ok(value) => {
                    trace!(key = %key, sequence = value, "Handed sequence slot");
                    return value;
                }
                // Sender dropped: the coordinator was reset while we waited.
                // Start over against the fresh state.
                Err(_) => continue,
            }
        }
    }

    /// Release the key's slot: advance the counter past the completed holder,
    /// then hand the lock to the oldest live waiter.
    pub fn release(&self, key: SequenceKey) {
        let mut entries = self.entries.lock();
        let Some(state) = entries.get_mut(&key) else {
            return;
        };
        if !state.locked {
            warn!(key = %key, "Release without an active holder");
            return;
        }

        if state.resynced_during_hold {
            // The counter was just replaced by the authoritative value; the
            // next holder submits exactly that value.
            state.resynced_during_hold = false;
        } else {
            state.current += 1;
        }

        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(state.current).is_ok() {
                // Lock transfers directly to the waiter.
                return;
            }
            // Receiver dropped (cancelled task); try the next in line.
        }
        state.locked = false;
    }

    /// Resynchronize the key's counter if `kind` is a sequence failure.
    ///
    /// Returns `true` when the error was recognized and absorbed (the counter
    /// now matches the chain, or a recent resync already did), `false` when
    /// the error is not sequence-related and state was left untouched.
    pub async fn handle_error(
        &self,
        key: SequenceKey,
        address: &str,
        kind: ErrorKind,
    ) -> Result<bool, SequenceError> {
        if kind != ErrorKind::Sequence {
            return Ok(false);
        }

        {
            let mut entries = self.entries.lock();
            let state = entries.entry(key).or_default();
            if let Some(last) = state.last_sync {
                if last.elapsed() < self.resync_cooldown {
                    debug!(key = %key, "Resync suppressed by cooldown");
                    return Ok(true);
                }
            }
        }

        let authoritative = self.reader.authoritative_sequence(key.network, address).await?;

        let mut entries = self.entries.lock();
        let state = entries.entry(key).or_default();
        let previous = state.current;
        state.current = authoritative;
        state.last_sync = Some(Instant::now());
        if state.locked {
            state.resynced_during_hold = true;
        }
        info!(
            key = %key,
            previous,
            authoritative,
            "Resynchronized sequence from chain"
        );
        Ok(true)
    }

    /// Snapshot one key's state, if the key has been used.
    pub fn sequence_state(&self, key: SequenceKey) -> Option<SequenceSnapshot> {
        let entries = self.entries.lock();
        entries.get(&key).map(|state| SequenceSnapshot {
            current: state.current,
            locked: state.locked,
            waiting: state.waiters.len(),
        })
    }

    /// Number of keys with coordinator state.
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drop all per-key state. Used between simulation runs; parked waiters
    /// observe the reset and re-acquire against fresh state.
    pub fn reset_all(&self) {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        debug!(cleared, "Sequence coordinator reset");
    }
}
