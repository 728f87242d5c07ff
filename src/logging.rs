//! `tracing` subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{GraphError, Result};

/// Installs a global `fmt` subscriber filtered by `level`, which accepts any
/// `EnvFilter` directive (`info`, `gremlite=debug,warn`, ...).
///
/// Fails when the directive does not parse or a subscriber is already set.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| GraphError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| GraphError::InvalidArgument("logging already initialized".into()))
}
