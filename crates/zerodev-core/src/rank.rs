//! Token-set similarity ranking.
//!
//! Scores every chunk of the current snapshot against the query's
//! [`TokenSet`] with Jaccard similarity and keeps the best `top_k`.
//!
//! # Ordering
//!
//! Chunks are sorted by score, descending. The sort is stable, so chunks
//! with equal scores keep their snapshot order (file order, then
//! ascending `line_no`).

use std::cmp::Ordering;

use anyhow::Result;
use tracing::debug;

use crate::models::{CodeChunk, RankedChunk};
use crate::store::{SnapshotStore, CACHE_KEY};
use crate::tokens::TokenSet;

/// Default number of ranked chunks handed to assembly.
pub const DEFAULT_TOP_K: usize = 20;

/// Score and sort `chunks` against `query`, returning at most `top_k`.
pub fn rank_chunks(query: &TokenSet, chunks: &[CodeChunk], top_k: usize) -> Vec<RankedChunk> {
    let mut scored: Vec<(usize, f64)> = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| (i, query.jaccard(&c.token_set)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(i, score)| RankedChunk {
            chunk: chunks[i].clone(),
            score,
        })
        .collect()
}

/// Rank the snapshot currently held by `store`.
///
/// An absent or empty snapshot is a valid state and yields no results.
pub async fn rank_snapshot<S: SnapshotStore + ?Sized>(
    store: &S,
    query: &TokenSet,
    top_k: usize,
) -> Result<Vec<RankedChunk>> {
    let snapshot = match store.load(CACHE_KEY).await? {
        Some(s) if !s.is_empty() => s,
        _ => {
            debug!("no chunk snapshot to rank");
            return Ok(Vec::new());
        }
    };
    let ranked = rank_chunks(query, &snapshot.chunks, top_k);
    debug!(
        candidates = snapshot.chunks.len(),
        returned = ranked.len(),
        "ranked snapshot"
    );
    Ok(ranked)
}
