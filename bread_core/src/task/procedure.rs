//! Generic task built from lifecycle hooks.
//!
//! [`Procedure`] owns the bookkeeping every task needs (ownership checks,
//! the ready flag, state transitions, failure containment, diagnostics)
//! and delegates the actual work to a [`TaskHooks`] value.

use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use bread_common::diagnostics::Diagnostics;

use super::state::{Progress, TaskEvent, TaskState};
use super::Task;
use crate::context::ExecutionContext;
use crate::error::{ConfigurationError, TaskError, TaskFailure};
use crate::ownership::OwnershipGuard;
use crate::unit::{Unit, UnitMap, UnitRef};

/// What a hook sees of the task it runs in.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    ctx: &'a ExecutionContext,
    task: &'a str,
    diagnostics: &'a Diagnostics,
}

impl<'a> HookContext<'a> {
    pub fn new(ctx: &'a ExecutionContext, task: &'a str, diagnostics: &'a Diagnostics) -> Self {
        Self {
            ctx,
            task,
            diagnostics,
        }
    }

    /// Calling execution context.
    #[inline]
    pub fn context(&self) -> &'a ExecutionContext {
        self.ctx
    }

    #[inline]
    pub fn task_name(&self) -> &'a str {
        self.task
    }

    #[inline]
    pub fn diagnostics(&self) -> &'a Diagnostics {
        self.diagnostics
    }
}

/// Work performed by a [`Procedure`].
///
/// Hooks run with the procedure's lifecycle lock held; a hook must not call
/// back into its own procedure.
pub trait TaskHooks: Send + 'static {
    /// Units the hooks need, merged into the procedure's dependencies.
    fn dependencies(&self) -> UnitMap {
        UnitMap::new()
    }

    /// Called by `start`. A failure leaves the task ready.
    ///
    /// A panic in any hook is caught and handled like a returned failure.
    fn on_start(&mut self, _cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        Ok(())
    }

    /// Called by `update` until it returns `Done` or `Failed`.
    /// A failure counts as `Failed`.
    fn on_update(&mut self, cx: &HookContext<'_>) -> Result<Progress, TaskFailure>;

    /// Called by every `clean`, whether or not the task was started.
    /// A failure is logged and ignored.
    fn on_clean(&mut self, _cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        Ok(())
    }
}

/// Run one hook, turning a panic into a [`TaskFailure`].
fn contained<T>(hook: impl FnOnce() -> Result<T, TaskFailure>) -> Result<T, TaskFailure> {
    panic::catch_unwind(AssertUnwindSafe(hook))
        .unwrap_or_else(|payload| Err(TaskFailure::from_panic(&*payload)))
}

struct Lifecycle<H> {
    hooks: H,
    /// Terminal progress of the current run.
    outcome: Option<Progress>,
}

/// Task implementation over a [`TaskHooks`] value.
///
/// `start`, `update` and `clean` are serialized by one lock; `state()` and
/// `is_ready()` read atomics and never block.
pub struct Procedure<H: TaskHooks> {
    name: String,
    dependencies: UnitMap,
    guard: OwnershipGuard,
    diagnostics: Diagnostics,
    lifecycle: Mutex<Lifecycle<H>>,
    state: AtomicU8,
    ready: AtomicBool,
}

impl<H: TaskHooks> Procedure<H> {
    /// Wrap `hooks` into a task named `name`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::EmptyName` for an empty name.
    pub fn new(name: impl Into<String>, hooks: H) -> Result<Self, ConfigurationError> {
        Self::new_with_diagnostics(name, hooks, Diagnostics::default())
    }

    /// Like [`new`](Self::new), reporting to `diagnostics` from the start.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::EmptyName` for an empty name.
    pub fn new_with_diagnostics(
        name: impl Into<String>,
        hooks: H,
        diagnostics: Diagnostics,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        let dependencies = hooks.dependencies();
        let procedure = Self {
            guard: OwnershipGuard::new(name.clone(), diagnostics.clone()),
            name,
            dependencies,
            diagnostics,
            lifecycle: Mutex::new(Lifecycle {
                hooks,
                outcome: None,
            }),
            state: AtomicU8::new(TaskState::NotStarted.as_u8()),
            ready: AtomicBool::new(true),
        };
        procedure
            .diagnostics
            .initialized(&procedure.name, &procedure.dependencies);
        Ok(procedure)
    }

    /// Add a dependency next to those declared by the hooks.
    pub fn with_dependency(mut self, dep: UnitRef) -> Self {
        self.dependencies.insert(dep);
        self
    }

    /// Route this task's notifications to `diagnostics`. The current owner
    /// is kept.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.guard = self.guard.with_diagnostics(diagnostics.clone());
        self.diagnostics = diagnostics;
        self.diagnostics.initialized(&self.name, &self.dependencies);
        self
    }

    /// Inspect the hooks. Blocks while a lifecycle call is running.
    pub fn with_hooks<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.lifecycle.lock().hooks)
    }

    fn apply(&self, event: TaskEvent) -> TaskState {
        let next = self.state().next(event);
        self.state.store(next.as_u8(), Ordering::Release);
        next
    }
}

impl<H: TaskHooks> Unit for Procedure<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> UnitMap {
        self.dependencies.clone()
    }

    fn ownership(&self) -> Option<&OwnershipGuard> {
        Some(&self.guard)
    }
}

impl<H: TaskHooks> Task for Procedure<H> {
    fn start(&self, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let mut life = self.lifecycle.lock();
        self.guard.check_access(ctx)?;
        if !self.is_ready() {
            return Err(TaskError::NotReady {
                task: self.name.clone(),
            });
        }

        self.diagnostics.event(&self.name, "starting", ctx.id());
        let cx = HookContext::new(ctx, &self.name, &self.diagnostics);
        match contained(|| life.hooks.on_start(&cx)) {
            Ok(()) => {
                life.outcome = None;
                self.ready.store(false, Ordering::Release);
                let state = self.apply(TaskEvent::Started);
                self.diagnostics.set(&self.name, "state", state);
            }
            Err(failure) => {
                self.diagnostics.error(&self.name, "start failed", &failure);
            }
        }
        Ok(())
    }

    fn update(&self, ctx: &ExecutionContext) -> Result<Progress, TaskError> {
        let mut life = self.lifecycle.lock();
        self.guard.check_access(ctx)?;
        if self.is_ready() {
            return Err(TaskError::NotStarted {
                task: self.name.clone(),
            });
        }
        if let Some(outcome) = life.outcome {
            return Ok(outcome);
        }

        let cx = HookContext::new(ctx, &self.name, &self.diagnostics);
        let progress = contained(|| life.hooks.on_update(&cx)).unwrap_or_else(|failure| {
            self.diagnostics.error(&self.name, "update failed", &failure);
            Progress::Failed
        });

        if progress.is_done() {
            life.outcome = Some(progress);
            let state = self.apply(TaskEvent::Polled(progress));
            self.diagnostics.set(&self.name, "state", state);
        }
        Ok(progress)
    }

    fn clean(&self, ctx: &ExecutionContext) -> Result<(), TaskError> {
        let mut life = self.lifecycle.lock();
        self.guard.check_access(ctx)?;

        let cx = HookContext::new(ctx, &self.name, &self.diagnostics);
        if let Err(failure) = contained(|| life.hooks.on_clean(&cx)) {
            self.diagnostics.error(&self.name, "clean failed", &failure);
        }

        life.outcome = None;
        let state = self.apply(TaskEvent::Cleaned);
        self.ready.store(true, Ordering::Release);
        self.diagnostics.event(&self.name, "cleaned", state);
        Ok(())
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    #[inline]
    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }
}

impl<H: TaskHooks> fmt::Debug for Procedure<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("ready", &self.is_ready())
            .field("owner", &self.guard.owner())
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
