//! # zerodev CLI
//!
//! The `zerodev` binary indexes a workspace into overlapping code windows
//! and assembles repository context for generation prompts.
//!
//! ## Usage
//!
//! ```bash
//! zerodev --config ./config/zerodev.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `zerodev init` | Create the SQLite database and run schema migrations |
//! | `zerodev index` | Scan the workspace and replace the chunk snapshot |
//! | `zerodev status` | Show snapshot statistics |
//! | `zerodev search --file <path>` | Rank snapshot windows against a file |
//! | `zerodev context --file <path>` | Print the assembled repository context |
//! | `zerodev prompt "<text>"` | Print the generation payload for a prompt |

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zerodev_context::config::{self, Config};
use zerodev_context::progress::ProgressMode;
use zerodev_context::{index, migrate, prompt, retrieve, status};

/// zerodev: repository-level context retrieval for code generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/zerodev.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "zerodev",
    version,
    about = "Repository-level context retrieval for code generation",
    long_about = "zerodev cuts a workspace into overlapping line windows, ranks them against \
    the file being edited by token-set similarity, and packs the best matches into a \
    token-budgeted context block for a generation request."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/zerodev.toml`. When the file does not exist,
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/zerodev.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the workspace state table.
    /// Running it more than once is safe.
    Init,

    /// Index the workspace.
    ///
    /// Walks the workspace, cuts every source file into overlapping
    /// windows, and replaces the stored snapshot. Prints "No files to save."
    /// when nothing was found; the previous snapshot is then kept.
    Index {
        /// Workspace root; overrides `[workspace].root`.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Show file and chunk counts without writing the snapshot.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr: `human`, `json`, or `off`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Show snapshot statistics for the workspace.
    Status {
        /// Workspace root; overrides `[workspace].root`.
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Rank snapshot windows against a file.
    Search {
        /// The active file used as the query.
        #[arg(long)]
        file: PathBuf,

        /// Workspace root; overrides `[workspace].root`.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Maximum number of results (defaults to `[retrieval].top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the repository context assembled for a file.
    Context {
        /// The active file used as the query.
        #[arg(long)]
        file: PathBuf,

        /// Workspace root; overrides `[workspace].root`.
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Build the generation payload for a prompt.
    ///
    /// `@repo ...` attaches repository context, `@file ...` attaches the
    /// whole active file, anything else is sent without context.
    Prompt {
        /// The prompt text.
        text: String,

        /// The active file, if any.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Workspace root; overrides `[workspace].root`.
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let cfg = load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index {
            root,
            dry_run,
            progress,
        } => {
            let mode = ProgressMode::from_flag(progress.as_deref())?;
            let cfg = cfg.with_root(root);
            index::run_index(&cfg, dry_run, mode.reporter().as_ref()).await?;
        }
        Commands::Status { root } => {
            status::run_status(&cfg.with_root(root)).await?;
        }
        Commands::Search { file, root, limit } => {
            retrieve::run_search(&cfg.with_root(root), &file, limit).await?;
        }
        Commands::Context { file, root } => {
            retrieve::run_context(&cfg.with_root(root), &file).await?;
        }
        Commands::Prompt { text, file, root } => {
            prompt::run_prompt(&cfg.with_root(root), &text, file.as_deref()).await?;
        }
    }

    Ok(())
}
