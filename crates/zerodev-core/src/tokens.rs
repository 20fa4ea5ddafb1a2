//! Token-id multisets and the tokenizer that produces them.
//!
//! A [`TokenSet`] is the "embedding" of a window or a query: an ordered
//! sequence of integer ids, duplicates kept. It is compared only through
//! [`TokenSet::jaccard`], which collapses duplicates and works on sets of
//! ids. Any [`Tokenizer`] can back it as long as indexing and scoring use
//! the same one.
//!
//! # Sub-word scheme
//!
//! [`SubwordTokenizer`] pre-splits text the way byte-pair tokenizers do
//! (letters, digits, punctuation runs, whitespace runs, optional leading
//! space), then cuts every piece into units of at most
//! [`MAX_PIECE_CHARS`] characters. Each unit maps to the first four bytes
//! of its SHA-256 digest, so ids are stable across processes and runs.
//!
//! ```rust
//! use zerodev_core::tokens::{SubwordTokenizer, Tokenizer};
//!
//! let tok = SubwordTokenizer::new();
//! let a = tok.encode("fn main() {}");
//! assert_eq!(a, tok.encode("fn main() {}"));
//! assert!((a.jaccard(&a) - 1.0).abs() < 1e-12);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Longest sub-word unit, in characters (≈ 4 chars per token).
pub const MAX_PIECE_CHARS: usize = 4;

static PRETOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:s|t|re|ve|m|ll|d)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+")
        .expect("pre-tokenizer pattern is valid")
});

/// Ordered multiset of token ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSet(Vec<u32>);

impl TokenSet {
    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct ids, duplicates collapsed.
    pub fn distinct(&self) -> HashSet<u32> {
        self.0.iter().copied().collect()
    }

    /// Jaccard similarity over distinct ids: `|A ∩ B| / |A ∪ B|`.
    ///
    /// Symmetric, `1.0` for identical non-empty sets, and `0.0` when both
    /// sets are empty.
    pub fn jaccard(&self, other: &TokenSet) -> f64 {
        let a = self.distinct();
        let b = other.distinct();
        let intersection = a.intersection(&b).count();
        let union = a.len() + b.len() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }
}

impl From<Vec<u32>> for TokenSet {
    fn from(ids: Vec<u32>) -> Self {
        Self(ids)
    }
}

/// Deterministic text → token-id mapping.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> TokenSet;

    /// Token length of `text`, used for budget accounting.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Hash-backed sub-word tokenizer; see the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubwordTokenizer;

impl SubwordTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn for_each_piece(text: &str, mut f: impl FnMut(&str)) {
        for m in PRETOKEN.find_iter(text) {
            let word = m.as_str();
            let mut start = 0;
            let mut chars = 0;
            for (idx, _) in word.char_indices() {
                if chars == MAX_PIECE_CHARS {
                    f(&word[start..idx]);
                    start = idx;
                    chars = 0;
                }
                chars += 1;
            }
            if start < word.len() {
                f(&word[start..]);
            }
        }
    }
}

fn piece_id(piece: &str) -> u32 {
    let digest = Sha256::digest(piece.as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

impl Tokenizer for SubwordTokenizer {
    fn encode(&self, text: &str) -> TokenSet {
        let mut ids = Vec::new();
        Self::for_each_piece(text, |piece| ids.push(piece_id(piece)));
        TokenSet(ids)
    }

    fn count(&self, text: &str) -> usize {
        let mut n = 0;
        Self::for_each_piece(text, |_| n += 1);
        n
    }
}
