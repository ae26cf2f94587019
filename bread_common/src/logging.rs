//! Tracing subscriber setup.
//!
//! Hosts call [`init_tracing`] once at startup. `RUST_LOG` directives are
//! honoured on top of the configured level.

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{CoreConfig, LogFormat, LogLevel};

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Returns `false` if a global subscriber was already installed (for
/// example by a test harness); the existing one is left in place.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> bool {
    let level: Level = level.into();
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .json()
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .try_init(),
    };
    result.is_ok()
}

/// Install the subscriber described by a loaded configuration.
pub fn init_from_config(config: &CoreConfig) -> bool {
    init_tracing(config.shared.log_level, config.logging.format)
}
