//! Snapshot storage abstraction.
//!
//! The [`SnapshotStore`] trait is a keyed slot holding exactly one
//! [`ChunkSnapshot`] generation per key. Rebuilds replace the whole value;
//! there are no partial updates.
//!
//! # Visibility
//!
//! Implementations must make [`replace`](SnapshotStore::replace) atomic:
//! a concurrent [`load`](SnapshotStore::load) observes either the previous
//! snapshot or the new one, never a mix. Loaded snapshots are shared
//! behind an [`Arc`], so a reader keeps a consistent view even if a
//! rebuild lands while it is still ranking.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ChunkSnapshot;

/// Fixed key under which the workspace's chunk snapshot is stored.
pub const CACHE_KEY: &str = "zerodev";

/// Abstract storage backend for chunk snapshots.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](SnapshotStore::load) | Read the current snapshot, `None` if never written |
/// | [`replace`](SnapshotStore::replace) | Atomically swap in a new snapshot |
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the snapshot stored under `key`. An absent key is `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<Arc<ChunkSnapshot>>>;

    /// Replace the snapshot stored under `key` with `snapshot`.
    async fn replace(&self, key: &str, snapshot: ChunkSnapshot) -> Result<()>;
}
