//! Ranking invariants over generated history logs.
//! Covers determinism, dedup, exclusion, raw-order preservation
//! and strictly growing scores on repeats.

use std::collections::HashSet;

use anyhow::Result;
use hrank::core::{
    ExclusionSet, HistoryLog, OverflowPolicy, PrioritizedHistory, RankOptions, RankSorter,
    prioritize,
};
use proptest::prelude::*;

const EXCLUDED: [&str; 3] = ["ls", "pwd", "cd .."];

fn exclusions() -> ExclusionSet
{
    ExclusionSet::new(EXCLUDED)
}

fn rank(lines: &[String]) -> Option<PrioritizedHistory>
{
    let log = HistoryLog::new(lines.to_vec(), 0);
    prioritize(&log, &exclusions(), &RankOptions::default()).expect("clamp policy never fails")
}

fn command() -> impl Strategy<Value = String>
{
    prop_oneof![
        prop::sample::select(vec![
            "ls",
            "pwd",
            "cd ..",
            "git status",
            "make",
            "cargo test",
            "vim src/main.rs",
        ])
        .prop_map(String::from),
        "[a-z é]{1,10}",
    ]
}

fn history() -> impl Strategy<Value = Vec<String>>
{
    prop::collection::vec(command(), 0..80)
}

proptest! {
    #[test]
    fn ranking_is_deterministic(lines in history())
    {
        prop_assert_eq!(rank(&lines), rank(&lines));
    }

    #[test]
    fn raw_output_matches_input(lines in history())
    {
        match rank(&lines)
        {
            None => { prop_assert!(lines.is_empty()); }
            Some(h) => { prop_assert_eq!(h.raw, lines); }
        }
    }

    #[test]
    fn items_are_distinct_non_excluded_lines(lines in history())
    {
        let Some(h) = rank(&lines) else { return Ok(()); };

        let texts: Vec<&str> = h.commands().collect();
        let unique: HashSet<&str> = texts.iter().copied().collect();
        prop_assert_eq!(unique.len(), texts.len());

        let expected: HashSet<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !EXCLUDED.contains(l))
            .collect();
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn length_invariant(lines in history())
    {
        let Some(h) = rank(&lines) else { return Ok(()); };

        prop_assert!(h.items.len() <= h.raw.len());

        let all_distinct = lines.iter().collect::<HashSet<_>>().len() == lines.len();
        let none_excluded = lines.iter().all(|l| !EXCLUDED.contains(&l.as_str()));
        prop_assert_eq!(h.items.len() == h.raw.len(), all_distinct && none_excluded);
    }

    #[test]
    fn drain_is_ascending(lines in history())
    {
        let Some(h) = rank(&lines) else { return Ok(()); };
        prop_assert!(h.items.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn repeats_strictly_grow_score(lines in prop::collection::vec(command(), 1..40))
    {
        for end in 1..lines.len()
        {
            let cmd = &lines[end];
            if EXCLUDED.contains(&cmd.as_str())
            {
                continue;
            }

            let score_of = |h: Option<PrioritizedHistory>| {
                h.and_then(|h| h.items.into_iter().find(|r| &r.text == cmd).map(|r| r.score))
            };
            let before = score_of(rank(&lines[..end]));
            let after = score_of(rank(&lines[..=end]));

            if let (Some(b), Some(a)) = (before, after)
            {
                prop_assert!(a > b, "{cmd:?}: {b} -> {a}");
            }
        }
    }
}

#[test]
fn excluded_and_repeated_scenario() -> Result<()>
{
    let lines: Vec<String> = ["pwd", "git status", "git status", "ls"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let log = HistoryLog::new(lines.clone(), 0);

    let h = prioritize(&log, &ExclusionSet::new(["pwd", "ls"]), &RankOptions::default())?
        .expect("non-empty log");

    assert_eq!(h.raw, lines);
    assert_eq!(h.items.len(), 1);
    assert_eq!(h.items[0].text, "git status");
    // 10 on first sight, then 10 + round(10 ln 2) + 10
    assert_eq!(h.items[0].score, 27);
    Ok(())
}

#[test]
fn empty_log_is_distinct_from_all_excluded() -> Result<()>
{
    let empty = prioritize(&HistoryLog::default(), &exclusions(), &RankOptions::default())?;
    assert!(empty.is_none());

    let all_excluded = HistoryLog::new(vec!["ls".into(), "pwd".into()], 0);
    let ranked = prioritize(&all_excluded, &exclusions(), &RankOptions::default())?;
    assert_eq!(ranked.map(|h| h.items.len()), Some(0));
    Ok(())
}

#[test]
fn clamped_insert_is_cut_from_max_bucket()
{
    let mut rs = RankSorter::new(10, OverflowPolicy::Clamp);
    let placed = rs
        .insert(15, "oversized")
        .expect("clamp accepts big keys");
    assert_eq!(placed.key, 10);

    let cut = rs
        .cut(10, placed.id)
        .expect("entry lives in bucket 10");
    assert_eq!(cut.id(), placed.id);
    assert!(rs.is_empty());

    rs.reinsert(3, cut)
        .expect("in range");
    assert_eq!(rs.drain(), vec![(3, "oversized")]);
}

#[test]
fn frequent_recent_command_outranks_rare_one()
{
    let lines: Vec<String> = ["cargo build", "make", "make", "make"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let h = rank(&lines).expect("non-empty");

    let top = h
        .top_first()
        .next()
        .expect("two commands");
    assert_eq!(top.text, "make");
}
