//! Subscriber setup for `--verbose` and `RUST_LOG`.

use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. `RUST_LOG` takes precedence.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a compact stderr subscriber.
pub fn init(verbosity: u8) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::General(format!("Failed to initialize logging: {}", e)))
}
