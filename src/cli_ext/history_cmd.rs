//! CLI command handlers for ranking, raw listing and history removal.
//!
//! Handlers resolve the history file, run the ranking core and render the
//! result. Rendering writes to any `io::Write` so tests can capture it.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    cli::{AppContext, Order, RankArgs, RawArgs, RemoveArgs},
    core::prioritize::{PrioritizedHistory, RankedCommand, prioritize},
    infra::{
        config::Config,
        history_file::{HistorySession, read_history, resolve_history_path},
    },
};

/// Resolved rendering options for `hrank rank`.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions
{
    pub order: Order,
    /// 0 means no limit
    pub limit: usize,
    pub json: bool,
    pub scores: bool,
    pub color: bool,
}

impl RenderOptions
{
    pub fn from_args(
        args: &RankArgs,
        cfg: &Config,
        ctx: &AppContext,
    ) -> Self
    {
        Self {
            order: args
                .order
                .unwrap_or(cfg.output.order),
            limit: args
                .limit
                .unwrap_or(cfg.output.limit),
            json: args.json,
            scores: args.scores,
            color: !ctx.no_color,
        }
    }
}

#[derive(Serialize)]
struct RankedView<'a>
{
    total: usize,
    raw_count: usize,
    items: Vec<&'a RankedCommand>,
}

/// Flag beats config; config beats `$HISTFILE`.
pub fn history_path(
    flag: Option<&Path>,
    cfg: &Config,
) -> Result<PathBuf>
{
    resolve_history_path(flag.or(cfg
        .history_file
        .as_deref()))
}

#[instrument(skip_all)]
pub fn run_rank(
    args: RankArgs,
    history_file: &Path,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let log = read_history(history_file)?;
    let ranked = prioritize(&log, &cfg.exclusions(), &cfg.rank_options())?;
    let opts = RenderOptions::from_args(&args, cfg, ctx);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match ranked
    {
        Some(history) => render_ranked(&mut out, &history, &opts)?,
        None if opts.json => writeln!(out, "null")?,
        None =>
        {
            if !ctx.quiet
            {
                eprintln!("No history to rank in {}", history_file.display());
            }
        }
    }

    out.flush()
        .context("Failed to flush output")
}

/// Write ranked commands per `opts`.
pub fn render_ranked<W: Write>(
    out: &mut W,
    history: &PrioritizedHistory,
    opts: &RenderOptions,
) -> Result<()>
{
    let ordered: Box<dyn Iterator<Item = &RankedCommand> + '_> = match opts.order
    {
        Order::TopFirst => Box::new(history.top_first()),
        Order::Drain => Box::new(
            history
                .items
                .iter(),
        ),
    };
    let take = if opts.limit == 0 { usize::MAX } else { opts.limit };
    let items: Vec<&RankedCommand> = ordered
        .take(take)
        .collect();

    if opts.json
    {
        let view = RankedView {
            total: history
                .items
                .len(),
            raw_count: history
                .raw
                .len(),
            items,
        };
        serde_json::to_writer_pretty(&mut *out, &view).context("Failed to serialize ranking")?;
        writeln!(out)?;
        return Ok(());
    }

    for item in items
    {
        if opts.scores
        {
            let score = format!("{:>8}", item.score);
            if opts.color
            {
                writeln!(out, "{} {}", score.cyan(), item.text)?;
            }
            else
            {
                writeln!(out, "{} {}", score, item.text)?;
            }
        }
        else
        {
            writeln!(out, "{}", item.text)?;
        }
    }

    Ok(())
}

#[instrument(skip_all)]
pub fn run_raw(
    args: RawArgs,
    history_file: &Path,
    ctx: &AppContext,
) -> Result<()>
{
    let log = read_history(history_file)?;
    if log.is_empty()
    {
        if !ctx.quiet
        {
            eprintln!("No history in {}", history_file.display());
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_raw(&mut out, &log.lines, args.limit)?;
    out.flush()
        .context("Failed to flush output")
}

/// Write the last `limit` raw lines (all when 0), oldest first.
pub fn render_raw<W: Write>(
    out: &mut W,
    raw: &[String],
    limit: usize,
) -> Result<()>
{
    let skip = if limit == 0 { 0 } else { raw.len().saturating_sub(limit) };
    for line in &raw[skip..]
    {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[instrument(skip_all, fields(command = %args.command))]
pub fn run_remove(
    args: RemoveArgs,
    history_file: &Path,
    ctx: &AppContext,
) -> Result<()>
{
    let mut log = read_history(history_file)?;
    let mut session = HistorySession::open(history_file.to_path_buf());

    let removed = session.remove(&mut log, &args.command, ctx.dry_run)?;
    info!(removed, dry_run = ctx.dry_run, "remove finished");

    if !ctx.quiet
    {
        let verb = if ctx.dry_run { "Would remove" } else { "Removed" };
        let noun = if removed == 1 { "entry" } else { "entries" };
        if ctx.no_color
        {
            println!("{verb} {removed} {noun} matching {:?}", args.command);
        }
        else
        {
            println!("{} {removed} {noun} matching {:?}", verb.green(), args.command);
        }
    }

    if session.needs_reload()
    {
        if !ctx.quiet
        {
            eprintln!("History file changed; run `history -r` to reload it in your shell");
        }
        session.clear_dirty();
    }

    Ok(())
}
