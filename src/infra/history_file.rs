//! Shell history file access.
//!
//! Locates the history file, parses it into a [`HistoryLog`], and rewrites
//! it when commands are deleted. The ranking core never touches the disk;
//! everything I/O-shaped lives here.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::core::prioritize::{HistoryLog, strip_prefix};

/// Environment variable naming the history file.
pub const ENV_VAR_HISTFILE: &str = "HISTFILE";

/// Used when neither a configured path nor `HISTFILE` is present.
pub const DEFAULT_HISTORY_FILE: &str = "~/.bash_history";

/// File name suffix of zsh history files.
pub const ZSH_HISTORY_FILE: &str = ".zsh_history";

/// zsh extended history lines look like `: 1420549651:0;ls /tmp`.
/// Timestamps stay 10 digits until the year 2286, so the command starts
/// at a fixed offset.
pub const ZSH_HISTORY_ITEM_OFFSET: usize = 15;

/// Pick the history file: explicit path, then `$HISTFILE`, then
/// `~/.bash_history`. `~` and `$VAR` are expanded.
pub fn resolve_history_path(explicit: Option<&Path>) -> Result<PathBuf>
{
    if let Some(p) = explicit
    {
        return expand_path(&p.to_string_lossy());
    }

    match std::env::var(ENV_VAR_HISTFILE)
    {
        Ok(v) if !v
            .trim()
            .is_empty() =>
        {
            expand_path(&v)
        }
        _ => expand_path(DEFAULT_HISTORY_FILE),
    }
}

fn expand_path(raw: &str) -> Result<PathBuf>
{
    let expanded =
        shellexpand::full(raw).map_err(|e| anyhow!("Failed to expand path '{raw}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Number of leading characters to strip from every line of `path`.
pub fn item_offset(path: &Path) -> usize
{
    let is_zsh = path
        .file_name()
        .map(|n| {
            n.to_string_lossy()
                .ends_with(ZSH_HISTORY_FILE)
        })
        .unwrap_or(false);

    if is_zsh { ZSH_HISTORY_ITEM_OFFSET } else { 0 }
}

/// Read and parse a history file.
///
/// An unreadable file is a hard error; nothing can be ranked without it.
#[instrument]
pub fn read_history(path: &Path) -> Result<HistoryLog>
{
    let bytes = fs::read(path)
        .with_context(|| format!("Unable to read history file from '{}'", path.display()))?;

    let lines = parse_lines(&bytes);
    let prefix_len = item_offset(path);
    debug!(lines = lines.len(), prefix_len, "history loaded");

    Ok(HistoryLog::new(lines, prefix_len))
}

/// Split a history buffer into command lines.
///
/// Skips blank lines and bash timestamp comments (`#1700000000`).
/// Trailing `\r` is dropped; invalid UTF-8 is replaced.
pub fn parse_lines(bytes: &[u8]) -> Vec<String>
{
    let mut out = Vec::with_capacity(bytes.len() / 32);
    let mut start = 0usize;

    let ends = memchr::memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len()));
    for end in ends
    {
        let raw = line_body(&bytes[start..end]);
        start = end + 1;

        if raw.is_empty()
        {
            continue;
        }

        let line = String::from_utf8_lossy(raw);
        if is_timestamp_comment(&line)
        {
            continue;
        }
        out.push(line.into_owned());
    }

    out
}

/// A line without its newline and at most one trailing `\r`.
fn line_body(raw: &[u8]) -> &[u8]
{
    let raw = raw
        .strip_suffix(b"\n")
        .unwrap_or(raw);
    raw.strip_suffix(b"\r")
        .unwrap_or(raw)
}

/// `#` followed by one or more ASCII digits and nothing else.
pub fn is_timestamp_comment(line: &str) -> bool
{
    match line.strip_prefix('#')
    {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// History file plus the "changed on disk" flag for one session.
///
/// The flag starts clean and is set by [`HistorySession::remove`] when the
/// file was rewritten, telling the caller the shell should reload it.
#[derive(Debug, Clone)]
pub struct HistorySession
{
    path: PathBuf,
    dirty: bool,
}

impl HistorySession
{
    pub fn open(path: PathBuf) -> Self
    {
        Self { path, dirty: false }
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn is_dirty(&self) -> bool
    {
        self.dirty
    }

    pub fn clear_dirty(&mut self)
    {
        self.dirty = false;
    }

    /// Whether the running shell should re-read its history.
    pub fn needs_reload(&self) -> bool
    {
        self.dirty
    }

    /// Delete every line whose command equals `command`.
    ///
    /// Updates `log` in place and rewrites the file atomically. A bash
    /// timestamp comment directly above a removed line goes with it.
    /// With `dry_run` only the matches in `log` are counted.
    #[instrument(skip(self, log), fields(path = %self.path.display()))]
    pub fn remove(
        &mut self,
        log: &mut HistoryLog,
        command: &str,
        dry_run: bool,
    ) -> Result<usize>
    {
        let prefix_len = log.prefix_len;
        let matches = |line: &str| strip_prefix(line, prefix_len) == command;

        if dry_run
        {
            return Ok(log
                .lines
                .iter()
                .filter(|l| matches(l.as_str()))
                .count());
        }

        let removed = rewrite_without(&self.path, prefix_len, command)?;
        log.lines
            .retain(|l| !matches(l.as_str()));

        if removed > 0
        {
            info!(removed, "history entries deleted");
            self.dirty = true;
        }

        Ok(removed)
    }
}

fn rewrite_without(
    path: &Path,
    prefix_len: usize,
    command: &str,
) -> Result<usize>
{
    let bytes = fs::read(path)
        .with_context(|| format!("Unable to read history file from '{}'", path.display()))?;
    let mut out = Vec::with_capacity(bytes.len());
    let mut pending_stamp: Option<&[u8]> = None;
    let mut removed = 0usize;
    let mut start = 0usize;

    let ends = memchr::memchr_iter(b'\n', &bytes).chain(std::iter::once(bytes.len()));
    for end in ends
    {
        // kept lines are copied byte for byte, newline included
        let stop = (end + 1).min(bytes.len());
        let raw = &bytes[start..stop];
        let body = line_body(raw);
        start = stop;

        if raw.is_empty()
        {
            continue;
        }

        let line = String::from_utf8_lossy(body);
        if is_timestamp_comment(&line)
        {
            if let Some(prev) = pending_stamp.replace(raw)
            {
                out.extend_from_slice(prev);
            }
            continue;
        }

        if !line.is_empty() && strip_prefix(&line, prefix_len) == command
        {
            removed += 1;
            pending_stamp = None;
            continue;
        }

        if let Some(stamp) = pending_stamp.take()
        {
            out.extend_from_slice(stamp);
        }
        out.extend_from_slice(raw);
    }

    if let Some(stamp) = pending_stamp
    {
        out.extend_from_slice(stamp);
    }

    if removed > 0
    {
        write_atomic(path, &out)?;
    }

    Ok(removed)
}

fn write_atomic(
    path: &Path,
    contents: &[u8],
) -> Result<()>
{
    let dir = path
        .parent()
        .filter(|p| {
            !p.as_os_str()
                .is_empty()
        })
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .context("Failed to write history")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
