//! Shared network storage.
//!
//! Checkpoints are immutable `Arc` snapshots keyed by their training-step
//! counter. The trainer is the only writer; every actor reads the latest
//! snapshot before each episode. Actors holding an older `Arc` keep using
//! it until their next fetch.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use reverie_core::Network;
use tracing::debug;

pub struct SharedStorage {
    networks: RwLock<BTreeMap<u64, Arc<dyn Network>>>,
}

impl SharedStorage {
    /// Storage seeded with an initial snapshot, so `latest_network` is
    /// always answerable.
    pub fn new(initial: Arc<dyn Network>) -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(initial.training_steps(), initial);
        Self {
            networks: RwLock::new(networks),
        }
    }

    /// Snapshot with the highest step counter.
    pub fn latest_network(&self) -> Result<Arc<dyn Network>> {
        let networks = self
            .networks
            .read()
            .map_err(|e| anyhow!("network storage lock poisoned: {e}"))?;
        let (_, network) = networks
            .last_key_value()
            .ok_or_else(|| anyhow!("network storage is empty"))?;
        Ok(Arc::clone(network))
    }

    /// Publish a checkpoint under the given step counter.
    pub fn save_network(&self, step: u64, network: Arc<dyn Network>) -> Result<()> {
        let mut networks = self
            .networks
            .write()
            .map_err(|e| anyhow!("network storage lock poisoned: {e}"))?;
        debug!(step, "checkpoint published");
        networks.insert(step, network);
        Ok(())
    }

    /// Number of checkpoints held.
    pub fn len(&self) -> usize {
        self.networks.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
