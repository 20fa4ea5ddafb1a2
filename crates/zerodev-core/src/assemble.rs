//! Budget-constrained repository context assembly.
//!
//! Turns ranked chunks into a commented context block that is prepended to
//! a code-generation prompt for the active file.
//!
//! # Algorithm
//!
//! 1. Resolve the active file's [`Language`]; its comment token (`#` or
//!    `//`) prefixes every emitted line.
//! 2. For each ranked chunk, highest score first, re-read the chunk's
//!    source through a [`SourceReader`] (the file may have changed since
//!    indexing) and extend the window forward by one stride:
//!    `end = min(end_line_no + stride, line_count)`,
//!    `start = max(0, end - window_size)`.
//! 3. Format the lines as a block: path attribution, separator, commented
//!    lines, separator, blank line. Measure it with the [`Tokenizer`].
//! 4. Greedy fill: accept the block if it still fits the budget, otherwise
//!    skip it and try the next one. Blocks are never truncated.
//! 5. Reverse the accepted blocks so the best match sits last, closest to
//!    the prompt, and prefix the banner.
//!
//! The running total starts at the banner's own token length, so the whole
//! returned string fits the budget. A budget too small for the banner yields
//! an empty context.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ContextError;
use crate::models::{ChunkMetadata, RankedChunk};
use crate::tokens::Tokenizer;
use crate::window::split_lines;

/// Default token budget for the assembled context.
pub const DEFAULT_CONTEXT_LENGTH: usize = 2048;

const SEPARATOR_DASHES: usize = 50;

/// Languages whose files can serve as the query source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Cpp,
    Java,
    Php,
    TypeScript,
    CSharp,
    Shell,
    JavaScript,
}

impl Language {
    /// Resolve a language from the file's extension.
    pub fn from_path(path: &Path) -> Result<Self, ContextError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "py" => Ok(Language::Python),
            "cpp" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "php" => Ok(Language::Php),
            "ts" => Ok(Language::TypeScript),
            "cs" => Ok(Language::CSharp),
            "sh" => Ok(Language::Shell),
            "js" => Ok(Language::JavaScript),
            _ => Err(ContextError::UnsupportedLanguage(path.to_path_buf())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Php => "PHP",
            Language::TypeScript => "Typescript",
            Language::CSharp => "C#",
            Language::Shell => "Shell",
            Language::JavaScript => "JavaScript",
        }
    }

    pub fn comment_token(self) -> &'static str {
        match self {
            Language::Python | Language::Shell => "#",
            _ => "//",
        }
    }

    pub fn separator(self) -> String {
        format!("{} {}", self.comment_token(), "-".repeat(SEPARATOR_DASHES))
    }

    /// Header line plus separator, each newline-terminated.
    pub fn banner(self) -> String {
        format!(
            "{} Here are some relevant code fragments from other files of the repo:\n{}\n",
            self.comment_token(),
            self.separator()
        )
    }
}

/// One formatted fragment and its token length.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub text: String,
    pub token_len: usize,
}

/// Outcome of the greedy budget fill.
#[derive(Debug, Clone, Default)]
pub struct BudgetFill {
    /// Accepted blocks, in the order they were offered.
    pub accepted: Vec<ContextBlock>,
    /// Sum of accepted block lengths.
    pub total: usize,
    pub rejected: usize,
}

/// Accept each block whose length still fits, skip the rest.
///
/// `reserved` tokens are already spent before the first block.
pub fn fill_budget<I>(blocks: I, budget: usize, reserved: usize) -> BudgetFill
where
    I: IntoIterator<Item = ContextBlock>,
{
    let mut fill = BudgetFill::default();
    let mut running = reserved;
    for block in blocks {
        if running + block.token_len <= budget {
            running += block.token_len;
            fill.total += block.token_len;
            fill.accepted.push(block);
        } else {
            fill.rejected += 1;
        }
    }
    fill
}

/// Window bounds after extending forward by one stride in a file of
/// `line_count` lines.
pub fn extended_range(meta: &ChunkMetadata, line_count: usize) -> (usize, usize) {
    let end = (meta.end_line_no + meta.stride()).min(line_count);
    let start = end.saturating_sub(meta.window_size);
    (start, end)
}

/// Render one fragment as commented lines under a path attribution.
pub fn format_block(relative_path: &str, lines: &[&str], language: Language) -> String {
    let comment = language.comment_token();
    let sep = language.separator();
    let body = lines
        .iter()
        .map(|line| format!("{} {}", comment, line))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{} the below code fragment can be found in: {}\n{}\n{}\n{}\n\n",
        comment, relative_path, sep, body, sep
    )
}

/// Banner followed by the accepted blocks, best match last.
pub fn render(mut accepted: Vec<ContextBlock>, language: Language) -> String {
    accepted.reverse();
    let joined = accepted
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}{}", language.banner(), joined)
}

/// Path as shown in attributions: relative to the workspace root when
/// possible.
pub fn relative_display(path: &Path, workspace_root: &Path) -> String {
    path.strip_prefix(workspace_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Reads the current text of a chunk's source file.
///
/// Implementations decide how a file becomes text (notebooks, for
/// example, are unwrapped to their code cells).
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn read_current(&self, path: &Path) -> Result<String>;
}

/// Inputs for one assembly run, threaded explicitly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    /// The active file; decides the comment syntax.
    pub query_path: &'a Path,
    pub workspace_root: &'a Path,
    pub budget: usize,
}

/// The assembled context and what happened to each candidate.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub language: Language,
    pub text: String,
    pub accepted: usize,
    pub rejected: usize,
    /// Candidates skipped because their source could not be read.
    pub failed: usize,
    /// Tokens spent on the banner plus the accepted blocks.
    pub token_total: usize,
}

/// Builds context blocks from ranked chunks.
pub struct ContextAssembler<'a, T: Tokenizer, R: SourceReader> {
    tokenizer: &'a T,
    reader: &'a R,
}

impl<'a, T: Tokenizer, R: SourceReader> ContextAssembler<'a, T, R> {
    pub fn new(tokenizer: &'a T, reader: &'a R) -> Self {
        Self { tokenizer, reader }
    }

    /// Re-read, extend, and format one ranked chunk.
    ///
    /// Returns `Ok(None)` when the current file has no lines in range.
    pub async fn make_block(
        &self,
        ranked: &RankedChunk,
        language: Language,
        workspace_root: &Path,
    ) -> Result<Option<ContextBlock>> {
        let meta = &ranked.chunk.metadata;
        let content = self.reader.read_current(&meta.file_path).await?;
        let lines = split_lines(&content);
        let (start, end) = extended_range(meta, lines.len());
        if start >= end {
            return Ok(None);
        }
        let relative = relative_display(&meta.file_path, workspace_root);
        let text = format_block(&relative, &lines[start..end], language);
        let token_len = self.tokenizer.count(&text);
        Ok(Some(ContextBlock { text, token_len }))
    }

    /// Assemble the repository context for `ranked`, best match first.
    pub async fn assemble(
        &self,
        ranked: &[RankedChunk],
        req: AssemblyRequest<'_>,
    ) -> Result<AssembledContext, ContextError> {
        let language = Language::from_path(req.query_path)?;
        let reserved = self.tokenizer.count(&language.banner());
        if reserved > req.budget {
            debug!(
                banner = reserved,
                budget = req.budget,
                "budget cannot hold the banner, emitting no context"
            );
            return Ok(AssembledContext {
                language,
                text: String::new(),
                accepted: 0,
                rejected: ranked.len(),
                failed: 0,
                token_total: 0,
            });
        }

        let mut blocks = Vec::with_capacity(ranked.len());
        let mut failed = 0;
        for candidate in ranked {
            match self.make_block(candidate, language, req.workspace_root).await {
                Ok(Some(block)) => blocks.push(block),
                Ok(None) => {
                    debug!(
                        path = %candidate.chunk.metadata.file_path.display(),
                        "window no longer has lines, skipping"
                    );
                }
                Err(e) => {
                    warn!(
                        path = %candidate.chunk.metadata.file_path.display(),
                        error = %e,
                        "failed to read chunk source, skipping"
                    );
                    failed += 1;
                }
            }
        }

        let fill = fill_budget(blocks, req.budget, reserved);
        debug!(
            accepted = fill.accepted.len(),
            rejected = fill.rejected,
            failed,
            tokens = reserved + fill.total,
            budget = req.budget,
            "assembled repository context"
        );

        Ok(AssembledContext {
            language,
            accepted: fill.accepted.len(),
            rejected: fill.rejected,
            failed,
            token_total: reserved + fill.total,
            text: render(fill.accepted, language),
        })
    }
}
