//! # Structured Logging
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! embedding program's call. These helpers set up the usual one: an
//! `EnvFilter` honoring `RUST_LOG`, writing to stderr in pretty or JSON
//! form.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DEFAULT_LOG_LEVEL;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for local work.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

/// Install the global subscriber, or report that one is already set.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g.
/// `"tally_ledger=debug"`. Pass `None` for [`DEFAULT_LOG_LEVEL`].
pub fn try_init_logging(default_level: Option<&str>, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.unwrap_or(DEFAULT_LOG_LEVEL)));

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init()?,
    }

    tracing::info!("logging initialized (format={:?})", format);
    Ok(())
}

/// Like [`try_init_logging`], but a second call is a silent no-op.
pub fn init_logging(default_level: Option<&str>, format: LogFormat) {
    let _ = try_init_logging(default_level, format);
}
