//! Scripted chain reader for resync-path tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use stampede_sequencer::{ChainReader, SequenceError};
use stampede_types::NetworkId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Chain reader double with a fixed default value, per-address overrides,
/// and a one-shot failure switch.
pub struct ScriptedChain {
    default_value: u64,
    overrides: Mutex<HashMap<(NetworkId, String), u64>>,
    fail_next: Mutex<Option<String>>,
    reads: AtomicU64,
}

impl ScriptedChain {
    /// Every address reads back `value` unless overridden.
    pub fn fixed(value: u64) -> Self {
        Self {
            default_value: value,
            overrides: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(None),
            reads: AtomicU64::new(0),
        }
    }

    /// Pin the authoritative value for one address.
    pub fn set(&self, network: NetworkId, address: impl Into<String>, value: u64) {
        self.overrides
            .lock()
            .insert((network, address.into()), value);
    }

    /// Make the next read fail with `reason`, then recover.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    /// Number of authoritative reads served or failed.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for ScriptedChain {
    async fn authoritative_sequence(
        &self,
        network: NetworkId,
        address: &str,
    ) -> Result<u64, SequenceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(SequenceError::ReaderUnavailable {
                address: address.to_string(),
                reason,
            });
        }
        let overrides = self.overrides.lock();
        Ok(overrides
            .get(&(network, address.to_string()))
            .copied()
            .unwrap_or(self.default_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overrides_win_over_the_default() {
        let chain = ScriptedChain::fixed(3);
        chain.set(NetworkId(0), "wallet-0001", 42);

        let pinned = chain
            .authoritative_sequence(NetworkId(0), "wallet-0001")
            .await
            .unwrap();
        let default = chain
            .authoritative_sequence(NetworkId(0), "wallet-0002")
            .await
            .unwrap();
        assert_eq!(pinned, 42);
        assert_eq!(default, 3);
        assert_eq!(chain.reads(), 2);
    }

    #[tokio::test]
    async fn fail_next_is_one_shot() {
        let chain = ScriptedChain::fixed(0);
        chain.fail_next("node offline");

        let failed = chain.authoritative_sequence(NetworkId(0), "wallet-0001").await;
        assert!(failed.is_err());

        let recovered = chain
            .authoritative_sequence(NetworkId(0), "wallet-0001")
            .await;
        assert_eq!(recovered.unwrap(), 0);
    }
}
