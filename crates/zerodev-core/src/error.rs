//! Error conditions surfaced by retrieval and snapshot handling.
//!
//! Failures local to one file or one chunk never reach this type; they
//! are logged and skipped where they happen. The variants below are the
//! ones that make a whole retrieval meaningless, so callers can match
//! on them and fall back to an empty context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    /// No workspace root is open.
    #[error("no workspace folder is open")]
    NoWorkspace,

    /// No active document can serve as the query source.
    #[error("no active context: {0}")]
    NoActiveContext(String),

    /// The active file's extension has no known comment syntax.
    #[error("language not supported: {}", .0.display())]
    UnsupportedLanguage(PathBuf),

    /// The stored snapshot was written with a different schema version.
    #[error("snapshot schema version {found} does not match expected {expected}")]
    SnapshotVersion { found: u32, expected: u32 },

    /// The stored snapshot could not be decoded.
    #[error("snapshot is not decodable: {0}")]
    Snapshot(#[from] serde_json::Error),
}
