//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::settings::LoggingConfig;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice returns
/// an error instead of replacing the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
