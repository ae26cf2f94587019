//! Resolve the selector once, at start, and run that child to completion.

use std::sync::Arc;

use super::{Choices, disengage, engage, poll_child, release_child};
use crate::error::{ConfigurationError, TaskFailure};
use crate::selector::Selector;
use crate::task::{HookContext, Procedure, Progress, Task, TaskHooks};
use crate::unit::UnitMap;

pub struct SingleShotSelectable {
    choices: Choices,
    force: bool,
    active: Option<Arc<dyn Task>>,
}

impl SingleShotSelectable {
    /// `options[i]` runs if the selector reports state `i` at start.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::StateCountMismatch` if `options` does not have
    /// one task per selector state.
    pub fn new(
        selector: Arc<dyn Selector>,
        unselected: Arc<dyn Task>,
        options: Vec<Arc<dyn Task>>,
        force: bool,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            choices: Choices::new(selector, unselected, options)?,
            force,
            active: None,
        })
    }

    /// Build and wrap into a task named `name`.
    pub fn task(
        name: impl Into<String>,
        selector: Arc<dyn Selector>,
        unselected: Arc<dyn Task>,
        options: Vec<Arc<dyn Task>>,
        force: bool,
    ) -> Result<Procedure<Self>, ConfigurationError> {
        Procedure::new(name, Self::new(selector, unselected, options, force)?)
    }

    /// Name of the child chosen for the current run.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref().map(|task| task.name())
    }
}

impl TaskHooks for SingleShotSelectable {
    fn dependencies(&self) -> UnitMap {
        self.choices.dependencies()
    }

    fn on_start(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        let slot = self.choices.resolve(cx);
        let chosen = Arc::clone(self.choices.task(slot));
        cx.diagnostics().set(cx.task_name(), "active", slot);

        if !engage(&chosen, cx, self.force) {
            release_child(&chosen, cx);
            return Err(TaskFailure::msg(format!(
                "child `{}` did not start",
                chosen.name()
            )));
        }
        self.active = Some(chosen);
        Ok(())
    }

    fn on_update(&mut self, cx: &HookContext<'_>) -> Result<Progress, TaskFailure> {
        match &self.active {
            Some(child) => Ok(poll_child(child, cx)),
            None => Err(TaskFailure::msg("no active child")),
        }
    }

    fn on_clean(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        if let Some(child) = self.active.take() {
            disengage(&child, cx);
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
