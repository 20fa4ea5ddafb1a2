//! SQLite-backed [`SnapshotStore`] implementation.
//!
//! Snapshots live in the `workspace_state` table, one row per
//! `(workspace, key)`. The workspace column scopes every read and write to
//! one session, so several workspaces can share a database file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use zerodev_core::store::SnapshotStore;
use zerodev_core::ChunkSnapshot;

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of [`SnapshotStore`], scoped to one workspace.
pub struct SqliteStore {
    pool: SqlitePool,
    workspace: String,
}

impl SqliteStore {
    /// `workspace` is the scope string, normally the canonical workspace root.
    pub fn new(pool: SqlitePool, workspace: impl Into<String>) -> Self {
        Self {
            pool,
            workspace: workspace.into(),
        }
    }

    /// Connect to the configured database and scope the store to `root`.
    ///
    /// Applies the schema first, so indexing works on a fresh database.
    pub async fn open(config: &Config, root: &Path) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool, root.display().to_string()))
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Unix time of the last write under `key`, if any.
    pub async fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        let ts: Option<i64> = sqlx::query_scalar(
            "SELECT updated_at FROM workspace_state WHERE workspace = ? AND key = ?",
        )
        .bind(&self.workspace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ts)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn load(&self, key: &str) -> Result<Option<Arc<ChunkSnapshot>>> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT value FROM workspace_state WHERE workspace = ? AND key = ?",
        )
        .bind(&self.workspace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let snapshot = ChunkSnapshot::decode(&raw)
            .with_context(|| format!("stored snapshot '{}' is unreadable", key))?;
        Ok(Some(Arc::new(snapshot)))
    }

    async fn replace(&self, key: &str, snapshot: ChunkSnapshot) -> Result<()> {
        let value = snapshot.encode()?;
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO workspace_state (workspace, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(workspace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.workspace)
        .bind(key)
        .bind(&value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(
            workspace = %self.workspace,
            key,
            chunks = snapshot.chunks.len(),
            bytes = value.len(),
            "replaced snapshot"
        );
        Ok(())
    }
}
