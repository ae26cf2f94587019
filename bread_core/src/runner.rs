//! Driven task execution.
//!
//! [`run`] is the only path that performs the full cycle:
//!
//! ```text
//! acquire_all ─► start ─► update ⟲ (delay) ─► clean ─► release_all
//!                                  │                ▲
//!                                  └─ interrupted ──┘
//! ```
//!
//! Clean and release run from a drop guard, so they also happen when an
//! update is refused or the loop unwinds.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use bread_common::config::RunnerConfig;
use bread_common::consts::DEFAULT_UPDATE_DELAY_MS;

use crate::context::ExecutionContext;
use crate::error::RunError;
use crate::ownership::{acquire_all, release_all};
use crate::task::{Progress, Task, TaskState};

/// Parameters of a driven run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Take the task and its dependencies from other contexts.
    pub force_acquisition: bool,
    /// Delay between two update polls.
    pub update_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force_acquisition: false,
            update_delay: Duration::from_millis(DEFAULT_UPDATE_DELAY_MS),
        }
    }
}

impl From<&RunnerConfig> for RunOptions {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            force_acquisition: config.force_acquisition,
            update_delay: config.update_delay(),
        }
    }
}

impl RunOptions {
    pub fn forced(mut self, force: bool) -> Self {
        self.force_acquisition = force;
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// `start` took effect (its hook did not fail).
    pub started: bool,
    /// Number of `update` calls.
    pub polls: u64,
    /// Terminal progress, if the task completed.
    pub outcome: Option<Progress>,
    /// State after clean.
    pub final_state: TaskState,
    /// The loop ended because the context was interrupted.
    pub interrupted: bool,
}

struct Cleanup<'a, T: Task + ?Sized> {
    task: &'a T,
    ctx: &'a ExecutionContext,
}

impl<T: Task + ?Sized> Drop for Cleanup<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.task.clean(self.ctx) {
            warn!(task = self.task.name(), error = %err, "clean refused");
        }
        if let Err(err) = release_all(self.task, self.ctx) {
            warn!(task = self.task.name(), error = %err, "release failed");
        }
    }
}

/// Run `task` to completion on `ctx`.
///
/// Blocks the calling thread. Returns early, after cleaning, when `ctx` is
/// interrupted; the interrupt flag is left raised.
///
/// # Errors
///
/// `RunError::Graph` if the dependency closure cannot be computed (nothing
/// was acquired), `RunError::Task` if the task refused a lifecycle call,
/// typically because another context owns it.
pub fn run<T: Task + ?Sized>(
    task: &T,
    ctx: &ExecutionContext,
    options: &RunOptions,
) -> Result<RunSummary, RunError> {
    let acquisition = acquire_all(task, ctx, options.force_acquisition)?;
    let cleanup = Cleanup { task, ctx };
    if !acquisition.is_complete() {
        warn!(task = task.name(), denied = ?acquisition.denied, "running without full ownership");
    }

    task.start(ctx)?;
    let started = !task.is_ready();
    debug!(task = task.name(), context = %ctx, started, "run started");

    let mut polls = 0;
    let mut outcome = None;
    let mut interrupted = false;
    while !task.is_ready() {
        if ctx.is_interrupted() {
            interrupted = true;
            break;
        }
        let progress = task.update(ctx)?;
        polls += 1;
        if progress.is_done() {
            outcome = Some(progress);
            break;
        }
        if !ctx.sleep_interruptible(options.update_delay) {
            interrupted = true;
            break;
        }
    }

    drop(cleanup);
    let summary = RunSummary {
        started,
        polls,
        outcome,
        final_state: task.state(),
        interrupted,
    };
    info!(task = task.name(), ?summary, "run finished");
    Ok(summary)
}

/// Spawns each task on a dedicated thread with its own context.
#[derive(Debug, Clone, Default)]
pub struct TaskRunner {
    options: RunOptions,
}

impl TaskRunner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(RunOptions::from(config))
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `task` on a new thread named after it.
    ///
    /// The thread's context is terminated when the thread exits, normally
    /// or by unwinding, so anything it still owns becomes free.
    pub fn spawn(&self, task: Arc<dyn Task>) -> io::Result<RunnerHandle> {
        let name = task.name().to_string();
        let ctx = ExecutionContext::new(name.clone());
        let thread_ctx = ctx.clone();
        let options = self.options;

        let join = thread::Builder::new()
            .name(format!("bread-{name}"))
            .spawn(move || {
                let _exit = thread_ctx.exit_guard();
                run(task.as_ref(), &thread_ctx, &options)
            })?;

        Ok(RunnerHandle {
            task: name,
            ctx,
            join,
        })
    }
}

/// Handle to a spawned run.
#[derive(Debug)]
pub struct RunnerHandle {
    task: String,
    ctx: ExecutionContext,
    join: JoinHandle<Result<RunSummary, RunError>>,
}

impl RunnerHandle {
    /// Context the task runs on.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Ask the run to stop after the current poll.
    pub fn interrupt(&self) {
        self.ctx.interrupt();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to end.
    pub fn join(self) -> Result<RunSummary, RunError> {
        match self.join.join() {
            Ok(result) => result,
            Err(_) => Err(RunError::Panicked { task: self.task }),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
