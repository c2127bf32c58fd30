//! Tracing setup for step runs.
//!
//! Steps emit `tracing` events (the clipboard contents at `info`, wait
//! progress at `debug`). A harness calls [`init_tracing`] once; `RUST_LOG`
//! overrides the default `info` level.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global fmt subscriber writing through the test writer.
///
/// Returns `false` when a subscriber was already installed, so repeated calls
/// from several tests are harmless.
pub fn init_tracing() -> bool {
    init_tracing_with(LogFormat::Pretty)
}

/// Install a global fmt subscriber in the given format
pub fn init_tracing_with(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_test_writer();
    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
