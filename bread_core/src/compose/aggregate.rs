//! Run a fixed set of children to joint completion.

use std::sync::Arc;

use super::{acquire_child, disengage_all, poll_child, start_child};
use crate::error::{ConfigurationError, TaskFailure};
use crate::task::{HookContext, Procedure, Progress, Task, TaskHooks};
use crate::unit::{UnitMap, UnitRef};

/// Starts every child, polls every child on every update, and completes
/// once all of them are done.
///
/// A child keeps being polled after it finished; tasks report their
/// terminal progress again when polled after completion.
pub struct Aggregate {
    children: Vec<Arc<dyn Task>>,
    force: bool,
    /// First terminal progress seen per child in the current run.
    outcomes: Vec<Option<Progress>>,
}

impl Aggregate {
    /// # Errors
    ///
    /// `ConfigurationError::NoChildren` for an empty child list.
    pub fn new(children: Vec<Arc<dyn Task>>, force: bool) -> Result<Self, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::NoChildren {
                unit: "aggregate".to_string(),
            });
        }
        let outcomes = vec![None; children.len()];
        Ok(Self {
            children,
            force,
            outcomes,
        })
    }

    /// Build the aggregate and wrap it into a task named `name`.
    pub fn task(
        name: impl Into<String>,
        children: Vec<Arc<dyn Task>>,
        force: bool,
    ) -> Result<Procedure<Self>, ConfigurationError> {
        let name = name.into();
        let hooks = Self::new(children, force).map_err(|err| match err {
            ConfigurationError::NoChildren { .. } => ConfigurationError::NoChildren {
                unit: name.clone(),
            },
            other => other,
        })?;
        Procedure::new(name, hooks)
    }

    pub fn children(&self) -> &[Arc<dyn Task>] {
        &self.children
    }
}

impl TaskHooks for Aggregate {
    fn dependencies(&self) -> UnitMap {
        self.children
            .iter()
            .map(|child| UnitRef::task(Arc::clone(child)))
            .collect()
    }

    fn on_start(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        self.outcomes.fill(None);

        // All children are acquired before any of them starts.
        for child in &self.children {
            acquire_child(child, cx, self.force);
        }
        for child in &self.children {
            if !start_child(child, cx) {
                cx.diagnostics()
                    .error(cx.task_name(), "child did not start", child.name());
            }
        }
        Ok(())
    }

    fn on_update(&mut self, cx: &HookContext<'_>) -> Result<Progress, TaskFailure> {
        for (child, outcome) in self.children.iter().zip(self.outcomes.iter_mut()) {
            let progress = poll_child(child, cx);
            if outcome.is_none() && progress.is_done() {
                *outcome = Some(progress);
            }
        }

        if self.outcomes.iter().any(Option::is_none) {
            return Ok(Progress::Continue);
        }
        if self.outcomes.contains(&Some(Progress::Failed)) {
            return Ok(Progress::Failed);
        }
        Ok(Progress::Done)
    }

    fn on_clean(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        disengage_all(&self.children, cx);
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
