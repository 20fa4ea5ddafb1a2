//! # zerodev Core
//!
//! Shared, I/O-free logic for zerodev: data models, the sub-word tokenizer,
//! the overlapping window indexer, token-set similarity ranking, the
//! snapshot store abstraction, and budget-constrained context assembly.
//!
//! This crate contains no tokio, sqlx, or filesystem access. Reading
//! current file content during assembly goes through the
//! [`assemble::SourceReader`] trait, which the application implements.

pub mod assemble;
pub mod error;
pub mod models;
pub mod rank;
pub mod store;
pub mod tokens;
pub mod window;

pub use error::ContextError;
pub use models::{ChunkMetadata, ChunkSnapshot, CodeChunk, FileRecord, RankedChunk};
pub use tokens::{SubwordTokenizer, TokenSet, Tokenizer};
