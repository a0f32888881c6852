//! Process-wide tracing setup for catalog services.
//!
//! Handlers log through `tracing` macros and run inside `#[instrument]` spans
//! carrying `component` and `request_id`; this crate decides where those end
//! up. JSON is the default so log shippers can index span fields.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};

/// Initialize tracing from the environment (`RUST_LOG`, `CATALOG_LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops. A malformed
/// setting falls back to the defaults.
pub fn init() {
    let config = LoggingConfig::from_env().unwrap_or_default();
    let _ = try_init(&config);
}

/// Install a global subscriber for `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn try_init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter '{}'", config.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(config.with_target);

    match config.format {
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("tracing subscriber already installed"),
        LogFormat::Pretty => builder
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("tracing subscriber already installed"),
        LogFormat::Compact => builder
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("tracing subscriber already installed"),
    }
}
