use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AppContext, InitArgs, Order},
    core::{
        dedup_index::ExclusionSet,
        prioritize::{MIN_MAX_KEY_FLOOR, RankOptions},
        rank_sorter::OverflowPolicy,
    },
};

/// Config file names probed in the working directory, in priority order.
const CONFIG_PATHS: [&str; 2] = ["hrank.toml", ".hrank.toml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// History file (falls back to $HISTFILE, then ~/.bash_history)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,

    /// Commands that are never ranked
    pub exclude: Vec<String>,

    /// Rank sorter sizing
    pub ranking: RankingConfig,

    /// Default output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig
{
    /// Max key estimate per history line
    pub key_factor: u32,
    /// Smallest max key, whatever the history size (never below 100000)
    pub min_max_key: u32,
    /// Park oversized scores in the top bucket instead of failing
    pub clamp_oversized_keys: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{
    pub order: Order,
    /// 0 means no limit
    pub limit: usize,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            history_file: None,
            exclude: ["ls", "pwd", "cd", "cd ..", "hh", "mc", "ls ", "pwd ", "cd ", "cd .. ", "hh ", "mc "]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ranking: RankingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for RankingConfig
{
    fn default() -> Self
    {
        let opts = RankOptions::default();
        Self {
            key_factor: opts.key_factor,
            min_max_key: opts.min_max_key,
            clamp_oversized_keys: opts.overflow == OverflowPolicy::Clamp,
        }
    }
}

impl Default for OutputConfig
{
    fn default() -> Self
    {
        Self { order: Order::TopFirst, limit: 0 }
    }
}

impl Config
{
    /// Sorter options; `min_max_key` is raised to [`MIN_MAX_KEY_FLOOR`].
    pub fn rank_options(&self) -> RankOptions
    {
        RankOptions {
            key_factor: self
                .ranking
                .key_factor,
            min_max_key: self
                .ranking
                .min_max_key
                .max(MIN_MAX_KEY_FLOOR),
            overflow: if self
                .ranking
                .clamp_oversized_keys
            {
                OverflowPolicy::Clamp
            }
            else
            {
                OverflowPolicy::Reject
            },
        }
    }

    pub fn exclusions(&self) -> ExclusionSet
    {
        ExclusionSet::new(&self.exclude)
    }
}

/// Load configuration: defaults, then a config file (explicit or the first
/// of `hrank.toml`/`.hrank.toml` found in the working directory), then
/// `HRANK_*` environment variables (`__` separates nested keys).
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None =>
        {
            for path in &CONFIG_PATHS
            {
                if Path::new(path).exists()
                {
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    // Add environment variables with HRANK_ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("HRANK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("exclude"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("hrank.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        println!("{toml_string}");
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
