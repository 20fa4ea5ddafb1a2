//! Retrieval against the stored snapshot.
//!
//! The active document is the query: its text is tokenized, the snapshot is
//! ranked by token-set similarity, and the best windows are re-read from
//! disk and packed into a budgeted context string.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use zerodev_core::assemble::{
    relative_display, AssembledContext, AssemblyRequest, ContextAssembler, Language, SourceReader,
};
use zerodev_core::rank::rank_snapshot;
use zerodev_core::store::SnapshotStore;
use zerodev_core::{ContextError, RankedChunk, SubwordTokenizer, Tokenizer};

use crate::config::Config;
use crate::connector_fs::{read_source_text, resolve_root};
use crate::sqlite_store::SqliteStore;

/// The document currently being edited.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    pub path: PathBuf,
    pub text: String,
}

impl ActiveDocument {
    /// Open the active document from disk.
    ///
    /// Fails with [`ContextError::NoActiveContext`] when no path is given or
    /// the path is not a readable file.
    pub async fn open(path: Option<&Path>) -> Result<Self, ContextError> {
        let path = path.ok_or_else(|| ContextError::NoActiveContext("no document is open".into()))?;
        if !path.is_file() {
            return Err(ContextError::NoActiveContext(format!(
                "{} is not backed by a file",
                path.display()
            )));
        }
        let text = read_source_text(path)
            .await
            .map_err(|e| ContextError::NoActiveContext(format!("{:#}", e)))?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self { path, text })
    }
}

/// Reads chunk sources from the local filesystem.
pub struct FsSourceReader;

#[async_trait]
impl SourceReader for FsSourceReader {
    async fn read_current(&self, path: &Path) -> Result<String> {
        read_source_text(path).await
    }
}

/// Rank the snapshot against the active document.
pub async fn search<S: SnapshotStore + ?Sized>(
    store: &S,
    active: &ActiveDocument,
    top_k: usize,
) -> Result<Vec<RankedChunk>> {
    let tokenizer = SubwordTokenizer::new();
    let query = tokenizer.encode(&active.text);
    debug!(path = %active.path.display(), tokens = query.len(), "query tokenized");
    rank_snapshot(store, &query, top_k).await
}

/// Build the repository context for the active document.
pub async fn build_repo_context<S: SnapshotStore + ?Sized>(
    config: &Config,
    store: &S,
    active: &ActiveDocument,
    workspace_root: &Path,
) -> Result<AssembledContext> {
    // Fail on an unsupported language before doing any ranking work.
    Language::from_path(&active.path)?;

    let ranked = search(store, active, config.retrieval.top_k).await?;
    let tokenizer = SubwordTokenizer::new();
    let reader = FsSourceReader;
    let assembler = ContextAssembler::new(&tokenizer, &reader);
    let assembled = assembler
        .assemble(
            &ranked,
            AssemblyRequest {
                query_path: &active.path,
                workspace_root,
                budget: config.retrieval.context_length,
            },
        )
        .await?;
    Ok(assembled)
}

/// Run `zerodev search`.
pub async fn run_search(config: &Config, file: &Path, limit: Option<usize>) -> Result<()> {
    let root = resolve_root(&config.workspace)?;
    let active = ActiveDocument::open(Some(file)).await?;
    let store = SqliteStore::open(config, &root).await?;
    let ranked = search(&store, &active, limit.unwrap_or(config.retrieval.top_k)).await?;
    store.close().await;

    if ranked.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in ranked.iter().enumerate() {
        let meta = &result.chunk.metadata;
        println!(
            "{}. [{:.2}] {}:{}-{}",
            i + 1,
            result.score,
            relative_display(&meta.file_path, &root),
            meta.start_line_no + 1,
            meta.end_line_no
        );
        println!("    cached: {}", meta.last_cached.format("%Y-%m-%d %H:%M"));
        println!("    excerpt: \"{}\"", excerpt(&result.chunk.code));
        println!();
    }
    Ok(())
}

/// Run `zerodev context`.
pub async fn run_context(config: &Config, file: &Path) -> Result<()> {
    let root = resolve_root(&config.workspace)?;
    let active = ActiveDocument::open(Some(file)).await?;
    let store = SqliteStore::open(config, &root).await?;
    let assembled = build_repo_context(config, &store, &active, &root).await?;
    store.close().await;

    eprintln!(
        "context: {} blocks, {} rejected, {} unreadable, {} / {} tokens",
        assembled.accepted,
        assembled.rejected,
        assembled.failed,
        assembled.token_total,
        config.retrieval.context_length
    );
    println!("{}", assembled.text);
    Ok(())
}

fn excerpt(code: &str) -> String {
    let first = code.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > 80 {
        let cut: String = first.chars().take(77).collect();
        format!("{}...", cut)
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_no_document_is_no_active_context() {
        let err = ActiveDocument::open(None).await.unwrap_err();
        assert!(matches!(err, ContextError::NoActiveContext(_)));
    }

    #[tokio::test]
    async fn test_directory_is_not_a_document() {
        let tmp = TempDir::new().unwrap();
        let err = ActiveDocument::open(Some(tmp.path())).await.unwrap_err();
        assert!(matches!(err, ContextError::NoActiveContext(_)));
    }

    #[tokio::test]
    async fn test_notebook_document_is_unwrapped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nb.ipynb");
        fs::write(
            &path,
            r#"{"cells": [{"cell_type": "code", "source": ["a = 1"]}]}"#,
        )
        .unwrap();
        let doc = ActiveDocument::open(Some(&path)).await.unwrap();
        assert_eq!(doc.text, "a = 1");
    }

    #[tokio::test]
    async fn test_non_utf8_document_still_opens() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("legacy.sh");
        fs::write(&path, b"echo caf\xE9\n").unwrap();
        let doc = ActiveDocument::open(Some(&path)).await.unwrap();
        assert_eq!(doc.text, "echo caf\u{FFFD}\n");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("\n   fn main() {\n}"), "fn main() {");
        let long = "x".repeat(100);
        assert_eq!(excerpt(&long).chars().count(), 80);
    }
}
