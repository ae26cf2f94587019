//! Composition strategies.
//!
//! Each strategy is a [`TaskHooks`](crate::task::TaskHooks) value wrapped in
//! a [`Procedure`](crate::task::Procedure), so compositions are tasks and
//! nest freely. They drive their children's lifecycle and ownership
//! directly instead of going through the runner.
//!
//! | Strategy               | Children active       | Completes when          |
//! |------------------------|-----------------------|-------------------------|
//! | `Aggregate`            | all, concurrently     | every child is done     |
//! | `ContinuousSelectable` | the selected one      | never (clean to stop)   |
//! | `SingleShotSelectable` | selected at start     | that child is done      |
//!
//! A child that fails or misbehaves is logged and counted as failed; the
//! composition itself never propagates it.

pub mod aggregate;
pub mod continuous;
pub mod single_shot;

pub use aggregate::Aggregate;
pub use continuous::{ContinuousSelectable, Slot};
pub use single_shot::SingleShotSelectable;

use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::ownership::{acquire_all, release_all};
use crate::selector::{self, Selector};
use crate::task::{HookContext, Progress, Task};
use crate::unit::{UnitMap, UnitRef};

/// Acquire `child` with its ownable dependencies for the calling context.
///
/// Returns `false` only if the dependency graph could not be walked; a
/// partial acquisition is reported and left for ownership checks to settle.
fn acquire_child(child: &Arc<dyn Task>, cx: &HookContext<'_>, force: bool) -> bool {
    let diag = cx.diagnostics();
    match acquire_all(child.as_ref(), cx.context(), force) {
        Ok(acquisition) if !acquisition.is_complete() => {
            diag.error(
                cx.task_name(),
                "child acquisition incomplete",
                format_args!("{}: {:?}", child.name(), acquisition.denied),
            );
            true
        }
        Ok(_) => {
            diag.event(cx.task_name(), "child acquired", child.name());
            true
        }
        Err(err) => {
            diag.error(cx.task_name(), "child acquisition failed", &err);
            false
        }
    }
}

/// Start `child`, cleaning it first if a previous run was left open.
///
/// Returns whether the child is running afterwards.
fn start_child(child: &Arc<dyn Task>, cx: &HookContext<'_>) -> bool {
    if !child.is_ready() {
        clean_child(child, cx);
    }
    if let Err(err) = child.start(cx.context()) {
        cx.diagnostics()
            .error(cx.task_name(), "child start refused", &err);
    }
    !child.is_ready()
}

/// Acquire and start `child`.
fn engage(child: &Arc<dyn Task>, cx: &HookContext<'_>, force: bool) -> bool {
    acquire_child(child, cx, force) && start_child(child, cx)
}

/// Clean `child`, then release it and its ownable dependencies.
fn disengage(child: &Arc<dyn Task>, cx: &HookContext<'_>) {
    clean_child(child, cx);
    release_child(child, cx);
}

/// Clean every child, then release every child.
fn disengage_all(children: &[Arc<dyn Task>], cx: &HookContext<'_>) {
    for child in children {
        clean_child(child, cx);
    }
    for child in children {
        release_child(child, cx);
    }
}

fn clean_child(child: &Arc<dyn Task>, cx: &HookContext<'_>) {
    if let Err(err) = child.clean(cx.context()) {
        cx.diagnostics()
            .error(cx.task_name(), "child clean refused", &err);
    }
}

fn release_child(child: &Arc<dyn Task>, cx: &HookContext<'_>) {
    match release_all(child.as_ref(), cx.context()) {
        Ok(()) => cx
            .diagnostics()
            .event(cx.task_name(), "child released", child.name()),
        Err(err) => cx
            .diagnostics()
            .error(cx.task_name(), "child release failed", &err),
    }
}

/// Poll `child` once. A refused call counts as failed.
fn poll_child(child: &Arc<dyn Task>, cx: &HookContext<'_>) -> Progress {
    child.update(cx.context()).unwrap_or_else(|err| {
        cx.diagnostics()
            .error(cx.task_name(), "child update refused", &err);
        Progress::Failed
    })
}

/// Children of a selectable composition: one per selector state plus the
/// task run while nothing is selected.
struct Choices {
    selector: Arc<dyn Selector>,
    unselected: Arc<dyn Task>,
    options: Vec<Arc<dyn Task>>,
}

impl Choices {
    fn new(
        selector: Arc<dyn Selector>,
        unselected: Arc<dyn Task>,
        options: Vec<Arc<dyn Task>>,
    ) -> Result<Self, ConfigurationError> {
        let states = selector.number_of_states();
        if states != options.len() {
            return Err(ConfigurationError::StateCountMismatch {
                selector: selector.name().to_string(),
                states,
                choices: options.len(),
            });
        }
        Ok(Self {
            selector,
            unselected,
            options,
        })
    }

    fn task(&self, slot: Slot) -> &Arc<dyn Task> {
        match slot {
            Slot::Unselected => &self.unselected,
            Slot::State(i) => self.options.get(i).unwrap_or(&self.unselected),
        }
    }

    fn resolve(&self, cx: &HookContext<'_>) -> Slot {
        match selector::resolve(self.selector.as_ref(), cx.diagnostics()) {
            Some(i) => Slot::State(i),
            None => Slot::Unselected,
        }
    }

    fn dependencies(&self) -> UnitMap {
        let mut deps = UnitMap::new();
        deps.insert(UnitRef::selector(Arc::clone(&self.selector)));
        deps.insert(UnitRef::task(Arc::clone(&self.unselected)));
        for option in &self.options {
            deps.insert(UnitRef::task(Arc::clone(option)));
        }
        deps
    }
}
