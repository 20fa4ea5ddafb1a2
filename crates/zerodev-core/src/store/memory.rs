//! In-memory [`SnapshotStore`] implementation for tests and embedding hosts.
//!
//! Slots live in a `HashMap` behind `std::sync::RwLock`. Replacement swaps
//! the slot's `Arc` while holding the write lock, which is the whole
//! copy-on-write story: readers that already hold the old `Arc` are
//! unaffected.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::ChunkSnapshot;

use super::SnapshotStore;

/// In-memory snapshot slots.
pub struct InMemoryStore {
    slots: RwLock<HashMap<String, Arc<ChunkSnapshot>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Arc<ChunkSnapshot>>> {
        let slots = self
            .slots
            .read()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    async fn replace(&self, key: &str, snapshot: ChunkSnapshot) -> Result<()> {
        let fresh = Arc::new(snapshot);
        let mut slots = self
            .slots
            .write()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        slots.insert(key.to_string(), fresh);
        Ok(())
    }
}
