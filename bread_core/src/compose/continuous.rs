//! Follow a selector, hot-swapping the active child.

use std::fmt;
use std::sync::Arc;

use super::{Choices, disengage, engage, poll_child, release_child};
use crate::error::{ConfigurationError, TaskFailure};
use crate::selector::Selector;
use crate::task::{HookContext, Procedure, Progress, Task, TaskHooks};
use crate::unit::UnitMap;

/// Which child a selection resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// No selection: the unselected task runs.
    Unselected,
    /// The child for this selector state.
    State(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unselected => f.write_str("unselected"),
            Self::State(i) => write!(f, "state {i}"),
        }
    }
}

/// Re-reads the selector on every update and switches children when the
/// selection changes.
///
/// # Switch order
///
/// 1. clean the outgoing child
/// 2. release the outgoing child and its dependencies
/// 3. acquire the incoming child and its dependencies
/// 4. clean the incoming child if it was left running, then start it
///
/// The active child is updated on every cycle, including the one that
/// switched to it. A child that could not be started is released and
/// retried on the next cycle. Never completes on its own.
pub struct ContinuousSelectable {
    choices: Choices,
    force: bool,
    active: Option<Slot>,
}

impl ContinuousSelectable {
    /// `options[i]` runs while the selector reports state `i`.
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

    /// Slot whose child was started in the current run.
    pub fn active(&self) -> Option<Slot> {
        self.active
    }

    fn switch_to(&mut self, slot: Slot, cx: &HookContext<'_>) {
        if let Some(previous) = self.active.take() {
            disengage(self.choices.task(previous), cx);
        }

        let next = self.choices.task(slot);
        if !engage(next, cx, self.force) {
            cx.diagnostics()
                .error(cx.task_name(), "selected child did not start", next.name());
            release_child(next, cx);
            return;
        }
        self.active = Some(slot);
        cx.diagnostics().set(cx.task_name(), "active", slot);
    }
}

impl TaskHooks for ContinuousSelectable {
    fn dependencies(&self) -> UnitMap {
        self.choices.dependencies()
    }

    fn on_start(&mut self, _cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        self.active = None;
        Ok(())
    }

    fn on_update(&mut self, cx: &HookContext<'_>) -> Result<Progress, TaskFailure> {
        let slot = self.choices.resolve(cx);
        if self.active != Some(slot) {
            self.switch_to(slot, cx);
        }
        if let Some(active) = self.active {
            poll_child(self.choices.task(active), cx);
        }
        Ok(Progress::Continue)
    }

    fn on_clean(&mut self, cx: &HookContext<'_>) -> Result<(), TaskFailure> {
        if let Some(previous) = self.active.take() {
            disengage(self.choices.task(previous), cx);
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
