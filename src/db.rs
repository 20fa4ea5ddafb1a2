//! SQLite connection pool for the snapshot database.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

/// Index builds and retrieval runs are sequential; a small pool is enough.
const MAX_CONNECTIONS: u32 = 5;

/// Open the snapshot database, creating the file and its directory on first use.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = config.db.path.as_path();

    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create database directory: {}", dir.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}
