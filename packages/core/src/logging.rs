//! Process-wide `tracing` setup.

use std::io;

use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset or does not parse. sqlx logs every
/// statement at `info`, so it is held to `warn`.
pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install compact stderr logging as the global subscriber. Calls after the
/// first one leave the installed subscriber in place.
pub fn init_logging() {
    let installed = fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized");
    }
}
