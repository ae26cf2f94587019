//! BREAD Common Library
//!
//! Shared constants, configuration loading, tracing setup and the
//! diagnostic sink used by every BREAD workspace crate.
//!
//! # Module Structure
//!
//! - [`consts`] - Timing defaults and limits
//! - [`config`] - Configuration loading traits and types
//! - [`logging`] - Tracing subscriber installation
//! - [`diagnostics`] - Injected sink for unit notifications
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use bread_common::config::{ConfigLoader, CoreConfig};
//! use bread_common::diagnostics::Diagnostics;
//! ```

pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod logging;
pub mod prelude;
