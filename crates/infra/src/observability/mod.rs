//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries and test harnesses call
//! [`init_tracing`] once to get them printed.

use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global fmt subscriber filtered by `RUST_LOG`
///
/// `default_filter` applies when `RUST_LOG` is unset or invalid. Returns
/// `false` if a global subscriber was already installed; calling this more
/// than once is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    init_tracing_with(LogFormat::Pretty, default_filter)
}

pub fn init_tracing_with(format: LogFormat, default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init()
        }
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
    };

    installed.is_ok()
}
