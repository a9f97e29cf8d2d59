//! Logging setup for the binary.
//!
//! Filtering comes from `REFLECTGEN_LOG`, falling back to `RUST_LOG`, and
//! defaults to `info`. Output goes to stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "REFLECTGEN_LOG";

/// Filter used when neither variable is set.
pub const DEFAULT_FILTER: &str = "info";

/// Picks the filter directives from the two variables.
fn directives(reflectgen_log: Option<String>, rust_log: Option<String>) -> String {
    reflectgen_log
        .or(rust_log)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Builds the filter from the environment.
#[must_use]
pub fn build_filter() -> EnvFilter {
    let directives = directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    EnvFilter::builder().parse_lossy(directives)
}

/// Installs the global subscriber. Returns false if one was already set.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
