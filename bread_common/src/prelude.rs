//! Prelude module for common re-exports.
//!
//! ```rust
//! use bread_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::{LogFormat, LogLevel};
pub use crate::logging::{init_from_config, init_tracing};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, CoreConfig, RunnerConfig, SharedConfig};

// ─── Diagnostics ────────────────────────────────────────────────────
pub use crate::diagnostics::{
    DiagnosticKind, DiagnosticSink, Diagnostics, RecordingSink, SelectableSink,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_UPDATE_DELAY_MS, MAX_UPDATE_DELAY_MS};
