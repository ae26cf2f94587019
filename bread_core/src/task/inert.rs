//! Task that does nothing.
//!
//! Used as the "unselected" entry of selectable compositions. It has no
//! ownership guard, so it never takes anything from anyone.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::state::{Progress, TaskEvent, TaskState};
use super::Task;
use crate::context::ExecutionContext;
use crate::error::{ConfigurationError, TaskError};
use crate::unit::{Unit, UnitMap};

#[derive(Debug)]
pub struct InertTask {
    name: String,
    state: AtomicU8,
    ready: AtomicBool,
}

impl InertTask {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        Ok(Self {
            name,
            state: AtomicU8::new(TaskState::NotStarted.as_u8()),
            ready: AtomicBool::new(true),
        })
    }

    fn apply(&self, event: TaskEvent) {
        let next = self.state().next(event);
        self.state.store(next.as_u8(), Ordering::Release);
    }
}

impl Unit for InertTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> UnitMap {
        UnitMap::new()
    }
}

impl Task for InertTask {
    fn start(&self, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        if self
            .ready
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TaskError::NotReady {
                task: self.name.clone(),
            });
        }
        self.apply(TaskEvent::Started);
        Ok(())
    }

    fn update(&self, _ctx: &ExecutionContext) -> Result<Progress, TaskError> {
        if self.is_ready() {
            return Err(TaskError::NotStarted {
                task: self.name.clone(),
            });
        }
        self.apply(TaskEvent::Polled(Progress::Done));
        Ok(Progress::Done)
    }

    fn clean(&self, _ctx: &ExecutionContext) -> Result<(), TaskError> {
        self.apply(TaskEvent::Cleaned);
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
