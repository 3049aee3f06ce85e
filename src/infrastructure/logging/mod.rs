// Logging module - Logging infrastructure
use crate::domain::error::{TharsisError, TharsisResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the log filter: `RUST_LOG` wins, then `--verbose`, then the settings level
pub fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if verbose { "debug" } else { level };
    EnvFilter::try_new(format!("tharsis={},warn", level))
        .unwrap_or_else(|_| EnvFilter::new("tharsis=warn,warn"))
}

/// Initialize logging system
pub fn init_logging(level: &str, verbose: bool) -> TharsisResult<()> {
    tracing_subscriber::registry()
        .with(build_filter(level, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .map_err(|e| TharsisError::Settings {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    tracing::debug!("logging initialized");
    Ok(())
}
