use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "hrank")]
#[command(about = "Rank shell history by recency, frequency and brevity")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file instead of ./hrank.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// History file to read (default: $HISTFILE, then ~/.bash_history)
    #[arg(long, global = true, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the deduplicated, ranked history
    Rank(RankArgs),

    /// Print the raw history in original order
    Raw(RawArgs),

    /// Delete every occurrence of a command from the history file
    Remove(RemoveArgs),

    /// Initialize a hrank.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Print order for ranked output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    /// Highest score first
    #[default]
    TopFirst,
    /// Ascending score, as drained from the rank sorter
    Drain,
}

#[derive(Debug, Parser)]
pub struct RankArgs {
    /// Print at most N commands (0 = no limit; default from config)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output order (default from config)
    #[arg(long, value_enum)]
    pub order: Option<Order>,

    /// Emit JSON instead of plain lines
    #[arg(long)]
    pub json: bool,

    /// Prefix each command with its score
    #[arg(long)]
    pub scores: bool,
}

#[derive(Debug, Parser)]
pub struct RawArgs {
    /// Print only the last N lines (0 = all)
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,
}

#[derive(Debug, Parser)]
pub struct RemoveArgs {
    /// Exact command line to delete
    pub command: String,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to write hrank.toml into
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to stdout
    #[arg(long, conflicts_with = "out_dir")]
    pub stdout: bool,

    /// Directory to write the completion file into
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}
