//! Cooperative tasks.
//!
//! A task is an ownable unit with a start / update / clean lifecycle,
//! driven by repeated polling:
//!
//! ```text
//!            start             update → Done
//! NotStarted ─────► Running ──────────────────► Finished
//!                      │     update → Failed
//!                      ├──────────────────────► Errored
//!                      │     clean
//!                      └──────────────────────► Interrupted
//! ```
//!
//! `clean` always makes the task ready again, whatever state it is in.
//! Every lifecycle call first checks that the caller may access the task.

pub mod fn_task;
pub mod inert;
pub mod procedure;
pub mod state;

pub use fn_task::FnTask;
pub use inert::InertTask;
pub use procedure::{HookContext, Procedure, TaskHooks};
pub use state::{Progress, TaskState};

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::unit::Unit;

/// Pollable unit of work.
///
/// # Lifecycle
///
/// 1. `start()` once, while `is_ready()`.
/// 2. `update()` repeatedly until it reports a terminal [`Progress`].
///    Further calls keep returning that value.
/// 3. `clean()` to end the run, also on interruption. Idempotent.
///
/// Hook failures never escape these methods. Errors returned here mean the
/// caller broke the protocol (wrong owner, wrong phase).
pub trait Task: Unit {
    /// # Errors
    ///
    /// `TaskError::Ownership` if `ctx` may not access the task,
    /// `TaskError::NotReady` if a run is already in progress.
    fn start(&self, ctx: &ExecutionContext) -> Result<(), TaskError>;

    /// # Errors
    ///
    /// `TaskError::Ownership` if `ctx` may not access the task,
    /// `TaskError::NotStarted` if the task is ready.
    fn update(&self, ctx: &ExecutionContext) -> Result<Progress, TaskError>;

    /// # Errors
    ///
    /// `TaskError::Ownership` if `ctx` may not access the task.
    fn clean(&self, ctx: &ExecutionContext) -> Result<(), TaskError>;

    /// May be started now.
    fn is_ready(&self) -> bool;

    fn state(&self) -> TaskState;
}
