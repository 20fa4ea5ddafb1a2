//! # zerodev-context
//!
//! Repository-level context retrieval for code generation.
//!
//! The workspace is cut into overlapping line windows, each tokenized into
//! a token-id set. A query (the file being edited) is ranked against the
//! windows by Jaccard similarity, and the best matches are re-read from
//! disk and packed into a token-budgeted context string that primes a
//! generation request.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌────────────┐
//! │  Collector  │──▶│  Windowing  │──▶│  Snapshot  │
//! │  FS + nb    │   │  + tokens   │   │  (SQLite)  │
//! └─────────────┘   └─────────────┘   └─────┬──────┘
//!                                           │
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                 ┌──────────┐        ┌───────────┐
//!                 │  Ranker  │───────▶│ Assembler │──▶ payload
//!                 └──────────┘        └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! zerodev init                          # create database
//! zerodev index --root ./my-repo        # window the workspace
//! zerodev context --file ./my-repo/src/main.py
//! zerodev prompt "@repo add retry logic" --file ./my-repo/src/main.py
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`connector_fs`] | Workspace file collector |
//! | [`extract`] | Notebook code-cell extraction |
//! | [`index`] | Scan, window, and snapshot replacement |
//! | [`retrieve`] | Ranking and context assembly against the snapshot |
//! | [`prompt`] | Prompt routing and generation payload |
//! | [`sqlite_store`] | SQLite snapshot storage |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//!
//! The pure algorithms live in the `zerodev-core` crate.

pub mod config;
pub mod connector_fs;
pub mod db;
pub mod extract;
pub mod index;
pub mod migrate;
pub mod progress;
pub mod prompt;
pub mod retrieve;
pub mod sqlite_store;
pub mod status;
