//! Prompt routing and the generation payload.
//!
//! A prompt starting with `@repo` is primed with repository context, one
//! starting with `@file` with the whole active document, and anything else
//! is sent bare. Context failures never fail the prompt: they are logged
//! and the payload goes out with an empty context.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use zerodev_core::store::SnapshotStore;
use zerodev_core::ContextError;

use crate::config::Config;
use crate::connector_fs::resolve_root;
use crate::retrieve::{build_repo_context, ActiveDocument};
use crate::sqlite_store::SqliteStore;

/// Which context a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Repo,
    InFile,
    Normal,
}

impl PromptMode {
    pub fn route(input: &str) -> Self {
        if input.starts_with("@repo") {
            PromptMode::Repo
        } else if input.starts_with("@file") {
            PromptMode::InFile
        } else {
            PromptMode::Normal
        }
    }
}

/// Payload handed to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub context: String,
    pub command: String,
    pub linting_log: Option<String>,
}

impl GenerationRequest {
    pub fn new(config: &Config, prompt: &str, context: String) -> Self {
        Self {
            prompt: prompt.to_string(),
            context,
            command: config.generation.command.clone(),
            linting_log: None,
        }
    }
}

/// Repository context for `active`, ranked against `store`.
pub async fn repo_context<S: SnapshotStore + ?Sized>(
    config: &Config,
    store: &S,
    workspace_root: &Path,
    active: Option<&Path>,
) -> Result<String> {
    let active = ActiveDocument::open(active).await?;
    let assembled = build_repo_context(config, store, &active, workspace_root).await?;
    Ok(assembled.text)
}

/// The whole active document as context.
pub async fn in_file_context(active: Option<&Path>) -> Result<String> {
    let active = ActiveDocument::open(active).await?;
    if active.text.is_empty() {
        return Err(ContextError::NoActiveContext(format!(
            "{} is empty",
            active.path.display()
        ))
        .into());
    }
    Ok(active.text)
}

/// Replace a failed context build with the empty context.
pub fn or_empty_context(result: Result<String>) -> String {
    match result {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "no context, continuing without it");
            String::new()
        }
    }
}

async fn repo_context_for_workspace(config: &Config, active: Option<&Path>) -> Result<String> {
    let root = resolve_root(&config.workspace)?;
    let store = SqliteStore::open(config, &root).await?;
    let context = repo_context(config, &store, &root, active).await;
    store.close().await;
    context
}

/// Route `input` and build its payload.
pub async fn build_request(config: &Config, input: &str, active: Option<&Path>) -> GenerationRequest {
    let mode = PromptMode::route(input);
    debug!(?mode, "routing prompt");
    let context = match mode {
        PromptMode::Repo => or_empty_context(repo_context_for_workspace(config, active).await),
        PromptMode::InFile => or_empty_context(in_file_context(active).await),
        PromptMode::Normal => String::new(),
    };
    GenerationRequest::new(config, input, context)
}

/// Run `zerodev prompt`: print the payload as JSON on stdout.
pub async fn run_prompt(config: &Config, input: &str, active: Option<&Path>) -> Result<()> {
    if input.trim().is_empty() {
        anyhow::bail!("prompt is empty");
    }
    let request = build_request(config, input, active).await;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
