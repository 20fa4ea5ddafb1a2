use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema on an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per (workspace, key); the value is an opaque JSON document.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workspace_state (
            workspace TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (workspace, key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_workspace_state_updated_at ON workspace_state(updated_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
