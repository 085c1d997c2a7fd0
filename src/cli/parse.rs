//! CLI parse: clap types for pagetree. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pagetree CLI - page tree seeding, upgrade and inspection
#[derive(Parser)]
#[command(name = "pagetree")]
#[command(about = "Seed, upgrade and inspect a pagetree content store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the default language, root page and frontpage when missing
    Seed {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Seed, then migrate legacy languages and sort elements into cells
    Upgrade {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Apply pending schema migrations
    Migrate,
    /// Check the store's structural invariants
    Verify {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the page tree
    Tree {
        /// Only show the tree of this language code
        #[arg(long)]
        language: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List languages
    Languages {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write a starter config/config.toml into the workspace
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    /// Stable command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Seed { .. } => "seed",
            Commands::Upgrade { .. } => "upgrade",
            Commands::Migrate => "migrate",
            Commands::Verify { .. } => "verify",
            Commands::Tree { .. } => "tree",
            Commands::Languages { .. } => "languages",
            Commands::InitConfig { .. } => "init-config",
        }
    }
}
