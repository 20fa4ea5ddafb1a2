//! Snapshot status overview.
//!
//! Used by `zerodev status` to show whether the workspace has been indexed,
//! how big the snapshot is, and how old it is.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use zerodev_core::models::SNAPSHOT_VERSION;
use zerodev_core::store::{SnapshotStore, CACHE_KEY};

use crate::config::Config;
use crate::connector_fs::resolve_root;
use crate::progress::format_number;
use crate::sqlite_store::SqliteStore;

/// Run the status command: load the snapshot and print a summary.
pub async fn run_status(config: &Config) -> Result<()> {
    let root = resolve_root(&config.workspace)?;
    let store = SqliteStore::open(config, &root).await?;
    let snapshot = store.load(CACHE_KEY).await?;
    let updated_at = store.updated_at(CACHE_KEY).await?;
    store.close().await;

    let now = Utc::now();
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("zerodev status");
    println!("==============");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", human_size(db_size));
    println!("  Workspace:   {}", root.display());
    println!();

    let Some(snapshot) = snapshot else {
        println!("  Snapshot:    none (run `zerodev index`)");
        println!();
        return Ok(());
    };

    println!(
        "  Snapshot:    v{} (current v{})",
        snapshot.version, SNAPSHOT_VERSION
    );
    println!("  Files:       {}", format_number(snapshot.file_count() as u64));
    println!("  Chunks:      {}", format_number(snapshot.chunks.len() as u64));
    if let Some(first) = snapshot.chunks.first() {
        println!(
            "  Windows:     size {} / slice {} (stride {})",
            first.metadata.window_size,
            first.metadata.slice_size,
            first.metadata.stride()
        );
    }
    println!("  Built:       {}", describe_age(snapshot.built_at, now));
    if let Some(saved) = updated_at.and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        println!("  Saved:       {}", describe_age(saved, now));
    }
    println!();
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Timestamp plus a coarse age, e.g. `2024-05-01 12:00 (3h ago)`.
fn describe_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let stamp = at.format("%Y-%m-%d %H:%M");
    let elapsed = now.signed_duration_since(at);
    if elapsed < Duration::zero() {
        return stamp.to_string();
    }
    let age = if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        "<1m".to_string()
    };
    format!("{} ({} ago)", stamp, age)
}
