use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{ConsolidateError, Result};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`, e.g.
/// `RUST_LOG=sheet_consolidator=debug`. Output goes to stderr so that
/// command output on stdout stays clean.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|error| ConsolidateError::Logging(error.to_string()))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ConsolidateError::Logging(error.to_string()))
}
