//! Hooks assembled from closures.

use super::procedure::{HookContext, Procedure, TaskHooks};
use super::state::Progress;
use crate::error::{ConfigurationError, TaskFailure};
use crate::unit::{UnitMap, UnitRef};

type StepFn = Box<dyn FnMut(&HookContext<'_>) -> Result<(), TaskFailure> + Send>;
type UpdateFn = Box<dyn FnMut(&HookContext<'_>) -> Result<Progress, TaskFailure> + Send>;

/// [`TaskHooks`] built from closures, for small tasks.
///
/// ```rust
/// use bread_core::task::{FnTask, Progress};
///
/// let mut remaining = 3;
/// let blink = FnTask::new(move |_| {
///     remaining -= 1;
///     Ok(Progress::from_done(remaining == 0))
/// })
/// .into_procedure("blink")
/// .unwrap();
/// ```
pub struct FnTask {
    on_start: Option<StepFn>,
    on_update: UpdateFn,
    on_clean: Option<StepFn>,
    dependencies: UnitMap,
}

impl FnTask {
    pub fn new(
        on_update: impl FnMut(&HookContext<'_>) -> Result<Progress, TaskFailure> + Send + 'static,
    ) -> Self {
        Self {
            on_start: None,
            on_update: Box::new(on_update),
            on_clean: None,
            dependencies: UnitMap::new(),
        }
    }

    pub fn on_start(
        mut self,
        f: impl FnMut(&HookContext<'_>) -> Result<(), TaskFailure> + Send + 'static,
    ) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_clean(
        mut self,
        f: impl FnMut(&HookContext<'_>) -> Result<(), TaskFailure> + Send + 'static,
    ) -> Self {
        self.on_clean = Some(Box::new(f));
        self
    }

    pub fn depends_on(mut self, dep: UnitRef) -> Self {
        self.dependencies.insert(dep);
        self
    }

    pub fn into_procedure(
        self,
        name: impl Into<String>,
    ) -> Result<Procedure<Self>, ConfigurationError> {
        Procedure::new(name, self)
    }
}

impl TaskHooks for FnTask {
    fn dependencies(&self) -> UnitMap {
        self.dependencies.clone()
    }

    fn on_start(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        self.on_start.as_mut().map_or(Ok(()), |f| f(cx))
    }

    fn on_update(&mut self, cx: &HookContext<'_>) -> Result<Progress, TaskFailure> {
        (self.on_update)(cx)
    }

    fn on_clean(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        self.on_clean.as_mut().map_or(Ok(()), |f| f(cx))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
