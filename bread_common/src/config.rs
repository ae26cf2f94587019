//! TOML configuration of a BREAD host.
//!
//! One file carries the service identity plus the `[runner]` and
//! `[logging]` sections read by `bread_core`. Only `[shared]` is required.
//!
//! ```rust,no_run
//! use bread_common::config::{ConfigError, ConfigLoader, CoreConfig};
//! use std::path::Path;
//!
//! fn load() -> Result<CoreConfig, ConfigError> {
//!     let config = CoreConfig::load(Path::new("core.toml"))?;
//!     config.validate()?;
//!     Ok(config)
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::{DEFAULT_UPDATE_DELAY_MS, MAX_UPDATE_DELAY_MS};

/// Failure to obtain a usable configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("no configuration file at {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("cannot read {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    /// Not valid TOML, or does not match the expected layout.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// Well-formed but semantically wrong.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Verbosity of the tracing subscriber, spelled lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every ownership query.
    Trace,
    /// Lifecycle transitions and hand-offs.
    Debug,
    #[default]
    Info,
    /// Denied acquisitions and contained task failures.
    Warn,
    Error,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// `[shared]`: identity and verbosity of the host.
///
/// ```toml
/// [shared]
/// service_name = "arm-controller"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    pub service_name: String,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl SharedConfig {
    /// # Errors
    ///
    /// `ConfigError::Invalid` for a blank service name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("shared.service_name is blank".into()));
        }
        Ok(())
    }
}

/// `[runner]`: defaults for driven task execution.
///
/// ```toml
/// [runner]
/// update_delay_ms = 20
/// force_acquisition = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Delay between two update polls [ms].
    pub update_delay_ms: u64,

    /// Take ownership from other contexts when starting a run.
    pub force_acquisition: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            update_delay_ms: DEFAULT_UPDATE_DELAY_MS,
            force_acquisition: false,
        }
    }
}

impl RunnerConfig {
    #[inline]
    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay_ms)
    }

    /// # Errors
    ///
    /// `ConfigError::Invalid` if `update_delay_ms` is above
    /// [`MAX_UPDATE_DELAY_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_delay_ms > MAX_UPDATE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "runner.update_delay_ms = {} (max {MAX_UPDATE_DELAY_MS})",
                self.update_delay_ms
            )));
        }
        Ok(())
    }
}

/// `[logging]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub shared: SharedConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Check every section.
    ///
    /// # Errors
    ///
    /// The first `ConfigError::Invalid` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.runner.validate()
    }
}

/// Loading of any deserializable type from TOML.
///
/// Implemented for every `DeserializeOwned` type.
pub trait ConfigLoader: Sized + DeserializeOwned {
    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing file, `Unreadable` for other I/O errors,
    /// `Malformed` if parsing fails.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        })?;
        Self::from_toml(&text)
    }

    /// Parse an in-memory document.
    ///
    /// # Errors
    ///
    /// `ConfigError::Malformed` with the parser's message.
    fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Malformed(err.message().to_string()))
    }
}

impl<T: DeserializeOwned> ConfigLoader for T {}

// ─── Tests ──────────────────────────────────────────────────────────
