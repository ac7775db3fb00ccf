use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hrank::Config;
use hrank::cli::{AppContext, Cli, Commands};
use hrank::cli_ext::history_cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();

    hrank::infra::init_logging(cli.verbose);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    // Config and history file are only needed by history commands
    let load = || -> Result<(Config, PathBuf)> {
        let cfg = hrank::load_config(cli.config.as_deref())?;
        let history_file = history_cmd::history_path(cli.history_file.as_deref(), &cfg)?;
        Ok((cfg, history_file))
    };

    match cli.command {
        Commands::Rank(args) => {
            let (cfg, history_file) = load()?;
            history_cmd::run_rank(args, &history_file, &cfg, &ctx)
        }
        Commands::Raw(args) => {
            let (_, history_file) = load()?;
            history_cmd::run_raw(args, &history_file, &ctx)
        }
        Commands::Remove(args) => {
            let (_, history_file) = load()?;
            history_cmd::run_remove(args, &history_file, &ctx)
        }
        Commands::Init(args) => hrank::infra::config_init(args, &ctx),
        Commands::Completions(args) => hrank::completion::run(args, &ctx),
    }
}
