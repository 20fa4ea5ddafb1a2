//! TOML configuration parsing and validation.
//!
//! Every section except `[db]` is optional and falls back to the defaults
//! of the indexing and retrieval pipeline. See `config/zerodev.example.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use zerodev_core::assemble::DEFAULT_CONTEXT_LENGTH;
use zerodev_core::rank::DEFAULT_TOP_K;
use zerodev_core::window::{WindowParams, DEFAULT_SLICE_SIZE, DEFAULT_WINDOW_SIZE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkspaceConfig {
    /// Workspace root; `None` means no workspace is open.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_slice_size")]
    pub slice_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            slice_size: DEFAULT_SLICE_SIZE,
        }
    }
}

impl IndexingConfig {
    pub fn window_params(&self) -> WindowParams {
        WindowParams::new(self.window_size, self.slice_size)
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
fn default_slice_size() -> usize {
    DEFAULT_SLICE_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_context_length")]
    pub context_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            context_length: DEFAULT_CONTEXT_LENGTH,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_context_length() -> usize {
    DEFAULT_CONTEXT_LENGTH
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Command tag sent with every generation payload.
    #[serde(default = "default_command")]
    pub command: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
        }
    }
}

fn default_command() -> String {
    "gen".to_string()
}

impl Config {
    /// All-defaults config with the database under `./data`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/zerodev.sqlite"),
            },
            workspace: WorkspaceConfig::default(),
            indexing: IndexingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }

    /// Override the workspace root (CLI `--root`).
    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        if root.is_some() {
            self.workspace.root = root;
        }
        self
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.indexing.window_size == 0 {
        anyhow::bail!("indexing.window_size must be >= 1");
    }
    if config.indexing.slice_size == 0 {
        anyhow::bail!("indexing.slice_size must be >= 1");
    }
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.context_length == 0 {
        anyhow::bail!("retrieval.context_length must be >= 1");
    }
    if config.generation.command.trim().is_empty() {
        anyhow::bail!("generation.command must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults_apply() {
        let cfg = parse("[db]\npath = \"/tmp/z.sqlite\"\n").unwrap();
        assert_eq!(cfg.indexing.window_size, 20);
        assert_eq!(cfg.indexing.slice_size, 2);
        assert_eq!(cfg.retrieval.top_k, 20);
        assert_eq!(cfg.retrieval.context_length, 2048);
        assert_eq!(cfg.generation.command, "gen");
        assert!(cfg.workspace.root.is_none());
        assert_eq!(cfg.indexing.window_params().stride(), 10);
    }

    #[test]
    fn test_overrides() {
        let cfg = parse(
            r#"
[db]
path = "/tmp/z.sqlite"

[workspace]
root = "/srv/repo"
exclude_globs = ["**/vendor/**"]

[indexing]
window_size = 40
slice_size = 4

[retrieval]
top_k = 5
context_length = 512
"#,
        )
        .unwrap();
        assert_eq!(cfg.workspace.root, Some(PathBuf::from("/srv/repo")));
        assert_eq!(cfg.workspace.exclude_globs, vec!["**/vendor/**"]);
        assert_eq!(cfg.indexing.window_params().stride(), 10);
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.retrieval.context_length, 512);
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = parse("[db]\npath = \"x\"\n[indexing]\nwindow_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("window_size"));
    }

    #[test]
    fn test_rejects_zero_budget() {
        assert!(parse("[db]\npath = \"x\"\n[retrieval]\ncontext_length = 0\n").is_err());
        assert!(parse("[db]\npath = \"x\"\n[retrieval]\ntop_k = 0\n").is_err());
    }

    #[test]
    fn test_with_root_overrides_only_when_given() {
        let cfg = Config::minimal().with_root(Some(PathBuf::from("/a")));
        assert_eq!(cfg.workspace.root, Some(PathBuf::from("/a")));
        let cfg = cfg.with_root(None);
        assert_eq!(cfg.workspace.root, Some(PathBuf::from("/a")));
    }
}
