//! Index pipeline: scan the workspace, cut windows, replace the snapshot.
//!
//! Every run is a full rebuild. The new [`ChunkSnapshot`] replaces the
//! previous one wholesale; a run that finds nothing leaves the stored
//! snapshot untouched.

use anyhow::Result;
use tracing::info;

use zerodev_core::store::{SnapshotStore, CACHE_KEY};
use zerodev_core::window::WindowMaker;
use zerodev_core::{ChunkSnapshot, CodeChunk, FileRecord, SubwordTokenizer};

use crate::config::{Config, IndexingConfig};
use crate::connector_fs::{is_no_workspace, resolve_root, scan_workspace};
use crate::progress::{IndexProgressEvent, IndexProgressReporter};
use crate::sqlite_store::SqliteStore;

/// Files between two windowing progress events.
const PROGRESS_EVERY: usize = 100;

/// Outcome of one index build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub skipped: usize,
    pub chunks: usize,
    /// False when the build produced no chunks and nothing was written.
    pub saved: bool,
}

/// Cut every file into windows, reporting progress along the way.
pub fn window_files(
    files: &[FileRecord],
    indexing: &IndexingConfig,
    progress: &dyn IndexProgressReporter,
) -> Vec<CodeChunk> {
    let maker = WindowMaker::new(indexing.window_params(), SubwordTokenizer::new());
    let cached_at = chrono::Utc::now();
    let total = files.len() as u64;

    let mut chunks = Vec::new();
    for (i, file) in files.iter().enumerate() {
        chunks.extend(maker.windows_for_file(file, cached_at));
        let done = i + 1;
        if done % PROGRESS_EVERY == 0 || done == files.len() {
            progress.report(IndexProgressEvent::Windowing {
                n: done as u64,
                total,
            });
        }
    }
    chunks
}

/// Scan, window, and store a fresh snapshot in `store`.
pub async fn build_index<S: SnapshotStore + ?Sized>(
    config: &Config,
    store: &S,
    progress: &dyn IndexProgressReporter,
) -> Result<IndexSummary> {
    if let Some(root) = &config.workspace.root {
        progress.report(IndexProgressEvent::Scanning {
            root: root.display().to_string(),
        });
    }
    let scan = scan_workspace(&config.workspace).await?;
    let chunks = window_files(&scan.files, &config.indexing, progress);

    let mut summary = IndexSummary {
        files: scan.files.len(),
        skipped: scan.skipped,
        chunks: chunks.len(),
        saved: false,
    };
    if chunks.is_empty() {
        return Ok(summary);
    }

    store.replace(CACHE_KEY, ChunkSnapshot::new(chunks)).await?;
    summary.saved = true;
    info!(
        files = summary.files,
        chunks = summary.chunks,
        skipped = summary.skipped,
        "chunk snapshot replaced"
    );
    Ok(summary)
}

/// Run `zerodev index`.
pub async fn run_index(
    config: &Config,
    dry_run: bool,
    progress: &dyn IndexProgressReporter,
) -> Result<()> {
    let root = match resolve_root(&config.workspace) {
        Ok(root) => root,
        Err(e) if is_no_workspace(&e) => {
            tracing::warn!("{}", e);
            println!("No files to save.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if dry_run {
        let scan = scan_workspace(&config.workspace).await?;
        let chunks = window_files(&scan.files, &config.indexing, progress);
        println!("index {} (dry-run)", root.display());
        println!("  files found: {}", scan.files.len());
        println!("  skipped: {}", scan.skipped);
        println!("  chunks: {}", chunks.len());
        return Ok(());
    }

    let store = SqliteStore::open(config, &root).await?;
    let summary = build_index(config, &store, progress).await?;
    store.close().await;

    if !summary.saved {
        println!("No files to save.");
        return Ok(());
    }
    println!("index {}", root.display());
    println!("  files: {}", summary.files);
    println!("  skipped: {}", summary.skipped);
    println!("  chunks: {}", summary.chunks);
    println!("ok");
    Ok(())
}
