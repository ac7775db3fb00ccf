//! Tracing subscriber setup.
//!
//! Logs go to stderr so ranked output on stdout stays pipe-friendly.
//! The filter comes from `HRANK_LOG`, then `RUST_LOG`, and defaults to
//! `warn` (`debug` with `--verbose`).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directive.
pub const ENV_VAR_LOG: &str = "HRANK_LOG";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbose: bool)
{
    let default_level = if verbose { "debug" } else { "warn" };

    let env_filter = EnvFilter::try_from_env(ENV_VAR_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(verbose);

    // A subscriber may already be installed (tests, embedding)
    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Warning: logging already initialized: {e}");
    }
}
