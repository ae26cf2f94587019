//! System-wide constants for the BREAD workspace.
//!
//! Single source of truth for timing defaults and limits.

/// Default delay between two `update()` polls of a driven task, in milliseconds.
pub const DEFAULT_UPDATE_DELAY_MS: u64 = 50;

/// Upper bound for the configurable polling delay, in milliseconds.
pub const MAX_UPDATE_DELAY_MS: u64 = 10_000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bread/core.toml";

/// Label given to execution contexts that are created without one.
pub const ANONYMOUS_CONTEXT_LABEL: &str = "anonymous";
