//! Single-pass history prioritization.
//!
//! Walks the raw log oldest to newest, skips excluded commands, folds
//! repeats into one record whose score compounds on every occurrence, and
//! drains the rank sorter into the final ordering.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::{
    dedup_index::{DedupIndex, ExclusionSet},
    rank_sorter::{EntryId, OverflowPolicy, RankSorter, RankSorterError},
    ranking::{self, Score},
};

/// Raw history lines, oldest first, as produced by a log parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog
{
    pub lines: Vec<String>,
    /// Characters to skip at the start of every line before ranking
    /// (0 for plain bash history).
    pub prefix_len: usize,
}

impl HistoryLog
{
    pub fn new(
        lines: Vec<String>,
        prefix_len: usize,
    ) -> Self
    {
        Self { lines, prefix_len }
    }

    pub fn len(&self) -> usize
    {
        self.lines
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.lines
            .is_empty()
    }

    /// Command text of line `i` with the prefix removed.
    pub fn command_at(
        &self,
        i: usize,
    ) -> Option<&str>
    {
        self.lines
            .get(i)
            .map(|l| strip_prefix(l, self.prefix_len))
    }
}

/// Drop the first `prefix_len` characters. Lines shorter than the prefix
/// become empty.
pub fn strip_prefix(
    line: &str,
    prefix_len: usize,
) -> &str
{
    if prefix_len == 0
    {
        return line;
    }

    match line
        .char_indices()
        .nth(prefix_len)
    {
        Some((at, _)) => &line[at..],
        None => "",
    }
}

/// One distinct command and its accumulated score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCommand
{
    #[serde(rename = "command")]
    pub text: String,
    pub score: Score,
}

/// Output of a ranking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrioritizedHistory
{
    /// Deduplicated commands in drain order (ascending score).
    pub items: Vec<RankedCommand>,
    /// Every raw line in original log order.
    pub raw: Vec<String>,
}

impl PrioritizedHistory
{
    /// Commands in drain order.
    pub fn commands(&self) -> impl DoubleEndedIterator<Item = &str>
    {
        self.items
            .iter()
            .map(|r| r.text.as_str())
    }

    /// Highest score first.
    pub fn top_first(&self) -> impl Iterator<Item = &RankedCommand>
    {
        self.items
            .iter()
            .rev()
    }
}

/// Smallest max key the history commands size the sorter with.
pub const MIN_MAX_KEY_FLOOR: Score = 100_000;

/// Sizing and overflow handling for the rank sorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions
{
    /// Max key estimate per log line.
    pub key_factor: Score,
    /// Lower bound on the max key estimate.
    pub min_max_key: Score,
    pub overflow: OverflowPolicy,
}

impl Default for RankOptions
{
    fn default() -> Self
    {
        Self { key_factor: 1000, min_max_key: MIN_MAX_KEY_FLOOR, overflow: OverflowPolicy::Clamp }
    }
}

#[derive(Debug, Error)]
pub enum RankError
{
    #[error("cannot rank history line {position}: {source}")]
    Sorter
    {
        position: usize,
        #[source]
        source: RankSorterError,
    },
}

/// Where a command's record currently sits in the sorter.
#[derive(Debug, Clone, Copy)]
struct Handle
{
    id: EntryId,
    key: Score,
}

/// Rank a history log.
///
/// Returns `Ok(None)` for an empty log. A log whose lines are all excluded
/// yields `Some` with no items.
///
/// # Panics
///
/// Panics if a score overflows [`Score`] or the sorter loses track of a
/// record; both mean the scan and the sorter have desynchronized.
#[instrument(skip_all, fields(lines = log.len(), prefix = log.prefix_len))]
pub fn prioritize(
    log: &HistoryLog,
    exclusions: &ExclusionSet,
    opts: &RankOptions,
) -> Result<Option<PrioritizedHistory>, RankError>
{
    if log.is_empty()
    {
        debug!("empty history, nothing to rank");
        return Ok(None);
    }

    let mut sorter =
        RankSorter::for_log_len(log.len(), opts.key_factor, opts.min_max_key, opts.overflow);
    let mut index: DedupIndex<Handle> = DedupIndex::with_capacity(log.len());
    let mut raw = Vec::with_capacity(log.len());
    let mut excluded = 0usize;

    for (position, line) in log
        .lines
        .iter()
        .enumerate()
    {
        raw.push(line.clone());

        let text = strip_prefix(line, log.prefix_len);
        if exclusions.contains(text)
        {
            excluded += 1;
            continue;
        }
        let length = ranking::text_length(text);

        match index
            .get(text)
            .copied()
        {
            None =>
            {
                let score = ranking::score(0, position, length);
                let placed = sorter
                    .insert(score, RankedCommand { text: text.to_owned(), score })
                    .map_err(|source| RankError::Sorter { position, source })?;

                index.insert(text, Handle { id: placed.id, key: placed.key });
            }
            Some(handle) =>
            {
                let Some(cut) = sorter.cut(handle.key, handle.id)
                else
                {
                    panic!("rank sorter lost {text:?} at key {}", handle.key);
                };

                let Some(record) = sorter.get_mut(cut.id())
                else
                {
                    panic!("rank sorter has no record for {text:?}");
                };
                record.score = ranking::score(record.score, position, length);
                let score = record.score;

                let key = sorter
                    .reinsert(score, cut)
                    .map_err(|source| RankError::Sorter { position, source })?;

                if let Some(h) = index.get_mut(text)
                {
                    h.key = key;
                }
            }
        }
    }

    debug!(distinct = sorter.len(), excluded, max_key = sorter.max_key(), "scan complete");

    let items = sorter
        .drain()
        .into_iter()
        .map(|(_, record)| record)
        .collect();

    Ok(Some(PrioritizedHistory { items, raw }))
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn log(lines: &[&str]) -> HistoryLog
    {
        HistoryLog::new(
            lines
                .iter()
                .map(|s| s.to_string())
                .collect(),
            0,
        )
    }

    #[test]
    fn strip_prefix_by_chars()
    {
        assert_eq!(strip_prefix("ls", 0), "ls");
        assert_eq!(strip_prefix(": 1420549651:0;ls /tmp", 15), "ls /tmp");
        assert_eq!(strip_prefix("short", 15), "");
        assert_eq!(strip_prefix("ééls", 2), "ls");
    }

    #[test]
    fn command_at_strips()
    {
        let l = HistoryLog::new(vec![": 1420549651:0;make".into()], 15);
        assert_eq!(l.command_at(0), Some("make"));
        assert_eq!(l.command_at(1), None);
    }

    #[test]
    fn empty_log_is_none()
    {
        let out = prioritize(&log(&[]), &ExclusionSet::default(), &RankOptions::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn all_excluded_is_some_and_empty()
    {
        let ex = ExclusionSet::new(["ls", "pwd"]);
        let out = prioritize(&log(&["ls", "pwd", "ls"]), &ex, &RankOptions::default())
            .unwrap()
            .expect("non-empty log");

        assert!(out.items.is_empty());
        assert_eq!(out.raw, vec!["ls", "pwd", "ls"]);
    }

    #[test]
    fn repeat_accumulates_score()
    {
        let ex = ExclusionSet::new(["pwd", "ls"]);
        let out = prioritize(&log(&["pwd", "git status", "git status", "ls"]), &ex, &RankOptions::default())
            .unwrap()
            .unwrap();

        // position 1: 0 + 0 + 10, position 2: 10 + 7 + 10
        assert_eq!(out.items, vec![RankedCommand { text: "git status".into(), score: 27 }]);
        assert_eq!(out.raw, vec!["pwd", "git status", "git status", "ls"]);
    }

    #[test]
    fn drain_order_is_ascending_score()
    {
        let out = prioritize(&log(&["a", "bb", "a"]), &ExclusionSet::default(), &RankOptions::default())
            .unwrap()
            .unwrap();

        // a: 1 then 1 + 7 + 1 = 9, bb: 0 + 2 = 2
        let scores: Vec<_> = out
            .items
            .iter()
            .map(|r| (r.text.as_str(), r.score))
            .collect();
        assert_eq!(scores, vec![("bb", 2), ("a", 9)]);
        assert_eq!(
            out.top_first()
                .next()
                .map(|r| r.text.as_str()),
            Some("a")
        );
    }

    #[test]
    fn prefix_is_stripped_for_ranking_only()
    {
        let l = HistoryLog::new(
            vec![": 1420549651:0;make".into(), ": 1420549680:0;make".into()],
            15,
        );
        let out = prioritize(&l, &ExclusionSet::default(), &RankOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(out.commands().collect::<Vec<_>>(), vec!["make"]);
        assert_eq!(out.raw, l.lines);
    }

    #[test]
    fn reject_policy_surfaces_error()
    {
        let opts = RankOptions { key_factor: 1, min_max_key: 3, overflow: OverflowPolicy::Reject };
        let err = prioritize(&log(&["a much longer command"]), &ExclusionSet::default(), &opts)
            .unwrap_err();

        let RankError::Sorter { position, source } = err;
        assert_eq!(position, 0);
        assert_eq!(source, RankSorterError::KeyOutOfRange { key: 21, max_key: 3 });
    }

    #[test]
    fn clamp_policy_keeps_bumping_clamped_records()
    {
        let opts = RankOptions { key_factor: 1, min_max_key: 3, overflow: OverflowPolicy::Clamp };
        let out = prioritize(&log(&["long one", "x", "long one", "long one"]), &ExclusionSet::default(), &opts)
            .unwrap()
            .unwrap();

        assert_eq!(out.items.len(), 2);
        let long = out
            .items
            .iter()
            .find(|r| r.text == "long one")
            .unwrap();
        // 8, then 8 + 7 + 8 = 23, then 23 + 11 + 8 = 42
        assert_eq!(long.score, 42);
    }
}
