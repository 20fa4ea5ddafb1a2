//! Core data models that flow through indexing and retrieval.
//!
//! A scan produces [`FileRecord`]s, the window indexer turns them into
//! [`CodeChunk`]s, the chunk list is persisted as one versioned
//! [`ChunkSnapshot`], and ranking yields [`RankedChunk`]s.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::tokens::TokenSet;

/// Schema version written into every persisted snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A source file captured by a workspace scan.
///
/// Discarded once its chunks have been derived.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub last_modified: DateTime<Utc>,
    pub content: String,
}

/// Where a window sits inside its file and how it was cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: PathBuf,
    pub last_modified: DateTime<Utc>,
    pub last_cached: DateTime<Utc>,
    /// Anchor line the window was centred on.
    pub line_no: usize,
    /// Inclusive start into the file's line sequence.
    pub start_line_no: usize,
    /// Exclusive end into the file's line sequence.
    pub end_line_no: usize,
    pub window_size: usize,
    pub slice_size: usize,
}

impl ChunkMetadata {
    /// Distance between consecutive anchors: `max(1, window_size / slice_size)`.
    pub fn stride(&self) -> usize {
        stride_for(self.window_size, self.slice_size)
    }
}

/// `max(1, floor(window_size / slice_size))`; a zero `slice_size` also yields 1.
pub fn stride_for(window_size: usize, slice_size: usize) -> usize {
    window_size.checked_div(slice_size).unwrap_or(0).max(1)
}

/// One overlapping line window of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub code: String,
    pub metadata: ChunkMetadata,
    pub token_set: TokenSet,
}

/// A chunk paired with its similarity to the query, in `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: CodeChunk,
    pub score: f64,
}

/// The complete chunk list of one index build.
///
/// Stored wholesale under a single key and replaced wholesale by the next
/// build. The `version` tag makes schema drift an explicit decode error
/// instead of silently missing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub version: u32,
    pub built_at: DateTime<Utc>,
    pub chunks: Vec<CodeChunk>,
}

impl ChunkSnapshot {
    pub fn new(chunks: Vec<CodeChunk>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            built_at: Utc::now(),
            chunks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of distinct source files represented in the snapshot.
    pub fn file_count(&self) -> usize {
        let mut paths: Vec<&PathBuf> = self.chunks.iter().map(|c| &c.metadata.file_path).collect();
        paths.sort();
        paths.dedup();
        paths.len()
    }

    pub fn encode(&self) -> Result<String, ContextError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored snapshot, checking the version tag before the body.
    pub fn decode(raw: &str) -> Result<Self, ContextError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let found = value
            .get("version")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(0);
        if found != SNAPSHOT_VERSION {
            return Err(ContextError::SnapshotVersion {
                found,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}
