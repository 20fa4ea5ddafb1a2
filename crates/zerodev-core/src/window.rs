//! Overlapping line-window indexer.
//!
//! Slices each file's line sequence into fixed-size windows whose anchors
//! advance by a configurable stride, tokenizes each window, and emits one
//! [`CodeChunk`] per window.
//!
//! # Algorithm
//!
//! 1. `stride = max(1, window_size / slice_size)`.
//! 2. Split the file content on `\n`.
//! 3. For `line_no` in `0, stride, 2·stride, …` below the line count:
//!    - `delta = window_size / 2`
//!    - `start = max(0, line_no - delta)`
//!    - `end = min(line_count, line_no - delta + window_size)`
//! 4. Join `lines[start..end]` with `\n`, tokenize, emit a chunk.
//!    An empty range emits nothing.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use zerodev_core::models::FileRecord;
//! use zerodev_core::tokens::SubwordTokenizer;
//! use zerodev_core::window::{WindowMaker, WindowParams};
//!
//! let content = (0..100).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
//! let file = FileRecord { path: "a.py".into(), last_modified: Utc::now(), content };
//! let maker = WindowMaker::new(WindowParams::default(), SubwordTokenizer::new());
//! let chunks = maker.windows_for_file(&file, Utc::now());
//! assert_eq!(chunks.len(), 10);
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{stride_for, ChunkMetadata, CodeChunk, FileRecord};
use crate::tokens::Tokenizer;

/// Default number of lines per window.
pub const DEFAULT_WINDOW_SIZE: usize = 20;
/// Default slice count; the stride is `window_size / slice_size`.
pub const DEFAULT_SLICE_SIZE: usize = 2;

/// Window geometry, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub window_size: usize,
    pub slice_size: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            slice_size: DEFAULT_SLICE_SIZE,
        }
    }
}

impl WindowParams {
    pub fn new(window_size: usize, slice_size: usize) -> Self {
        Self {
            window_size,
            slice_size,
        }
    }

    pub fn stride(&self) -> usize {
        stride_for(self.window_size, self.slice_size)
    }

    /// Line bounds `(start, end)` of the window anchored at `line_no`.
    pub fn bounds(&self, line_no: usize, line_count: usize) -> (usize, usize) {
        let delta = self.window_size / 2;
        let start = line_no.saturating_sub(delta);
        let end = (line_no + self.window_size - delta).min(line_count);
        (start, end)
    }
}

/// Split file content into its line sequence. Empty content has no lines.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split('\n').collect()
}

/// Builds windows for files with a fixed geometry and tokenizer.
pub struct WindowMaker<T: Tokenizer> {
    params: WindowParams,
    tokenizer: T,
}

impl<T: Tokenizer> WindowMaker<T> {
    pub fn new(params: WindowParams, tokenizer: T) -> Self {
        Self { params, tokenizer }
    }

    pub fn params(&self) -> WindowParams {
        self.params
    }

    /// All windows of one file, in strictly increasing `line_no` order.
    pub fn windows_for_file(&self, file: &FileRecord, cached_at: DateTime<Utc>) -> Vec<CodeChunk> {
        let lines = split_lines(&file.content);
        let stride = self.params.stride();
        let mut chunks = Vec::new();

        for line_no in (0..lines.len()).step_by(stride) {
            let (start, end) = self.params.bounds(line_no, lines.len());
            if start >= end {
                continue;
            }
            let code = lines[start..end].join("\n");
            let token_set = self.tokenizer.encode(&code);
            chunks.push(CodeChunk {
                code,
                metadata: ChunkMetadata {
                    file_path: file.path.clone(),
                    last_modified: file.last_modified,
                    last_cached: cached_at,
                    line_no,
                    start_line_no: start,
                    end_line_no: end,
                    window_size: self.params.window_size,
                    slice_size: self.params.slice_size,
                },
                token_set,
            });
        }

        chunks
    }

    /// Windows for every file, concatenated in file order.
    pub fn build_windows(&self, files: &[FileRecord]) -> Vec<CodeChunk> {
        let cached_at = Utc::now();
        let chunks: Vec<CodeChunk> = files
            .iter()
            .flat_map(|f| self.windows_for_file(f, cached_at))
            .collect();
        debug!(files = files.len(), chunks = chunks.len(), "built windows");
        chunks
    }
}
