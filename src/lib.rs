//! **hrank** - Shell history ranking for history-selection tools
//!
//! One pass over the history log folds repeated commands into a single record
//! whose score blends recency, frequency and brevity, then drains a bucket
//! sorter into the final ordering.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Ranking core - pure, single-threaded, no I/O
pub mod core {
    /// String -> record handle lookup, reused as the exclusion set
    pub mod dedup_index;
    pub use dedup_index::{DedupIndex, ExclusionSet};

    /// Direct-addressed bucket sorter with in-place re-keying
    pub mod rank_sorter;
    pub use rank_sorter::{OverflowPolicy, RankSorter, RankSorterError};

    /// Recency/frequency/length scoring function
    pub mod ranking;
    pub use ranking::{Score, score};

    /// Scan/drain orchestration over a history log
    pub mod prioritize;
    pub use prioritize::{
        HistoryLog, PrioritizedHistory, RankError, RankOptions, RankedCommand, prioritize,
    };
}

/// Infrastructure - Configuration, history file I/O, and logging
pub mod infra {
    /// Configuration management with layered TOML/env sources
    pub mod config;
    pub use self::config::{Config, init as config_init, load_config};

    /// History file discovery, parsing and rewriting
    pub mod history_file;
    pub use history_file::{HistorySession, read_history, resolve_history_path};

    /// Tracing subscriber initialization
    pub mod logging;
    pub use logging::init_logging;
}

/// Subcommand handlers
pub mod cli_ext {
    /// `rank`, `raw` and `remove`
    pub mod history_cmd;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use infra::{Config, load_config};

// Core types for external consumers
pub use crate::core::{
    ExclusionSet, HistoryLog, PrioritizedHistory, RankOptions, RankedCommand, prioritize,
};
