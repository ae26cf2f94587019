//! Selection signals consumed by selectable compositions.
//!
//! A selector reports one of `number_of_states()` states, or no selection.
//! Compositions read it; they never drive its update cadence.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bread_common::diagnostics::{DiagnosticSink, Diagnostics, SelectableSink};

use crate::error::ConfigurationError;
use crate::unit::{Unit, UnitMap, UnitRef};

/// External integer-valued state source.
pub trait Selector: Unit {
    fn number_of_states(&self) -> usize;

    /// `None` means no selection.
    fn current_state(&self) -> Option<usize>;
}

/// Read `selector`, treating an out-of-range state as no selection.
pub fn resolve<S: Selector + ?Sized>(selector: &S, diagnostics: &Diagnostics) -> Option<usize> {
    let states = selector.number_of_states();
    match selector.current_state() {
        Some(state) if state >= states => {
            diagnostics.error(
                selector.name(),
                "selection out of range",
                format_args!("state {state} of {states}"),
            );
            None
        }
        state => {
            diagnostics.got(selector.name(), "current state", state);
            state
        }
    }
}

/// Diagnostic sink routed by `selector`: `sinks[i]` while it reports state
/// `i`, `unselected` otherwise.
///
/// The selector is read on every event without reporting the read, so a
/// selector may itself log to the returned sink.
///
/// # Errors
///
/// `ConfigurationError::StateCountMismatch` unless there is one sink per
/// selector state.
pub fn selectable_sink(
    selector: Arc<dyn Selector>,
    unselected: Arc<dyn DiagnosticSink>,
    sinks: Vec<Arc<dyn DiagnosticSink>>,
) -> Result<SelectableSink, ConfigurationError> {
    let states = selector.number_of_states();
    if sinks.len() != states {
        return Err(ConfigurationError::StateCountMismatch {
            selector: selector.name().to_string(),
            states,
            choices: sinks.len(),
        });
    }
    Ok(SelectableSink::new(
        move || selector.current_state().filter(|&state| state < states),
        unselected,
        sinks,
    ))
}

const NO_SELECTION: usize = usize::MAX;

/// Selector whose value is set from outside, from any thread.
pub struct ManualSelector {
    name: String,
    states: usize,
    value: AtomicUsize,
}

impl ManualSelector {
    /// Selector with `states` states and no initial selection.
    pub fn new(name: impl Into<String>, states: usize) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        Ok(Self {
            name,
            states,
            value: AtomicUsize::new(NO_SELECTION),
        })
    }

    /// Store a new selection. Out-of-range values are stored as given.
    pub fn set(&self, state: Option<usize>) {
        self.value
            .store(state.unwrap_or(NO_SELECTION), Ordering::Release);
    }
}

impl Unit for ManualSelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> UnitMap {
        UnitMap::new()
    }
}

impl Selector for ManualSelector {
    fn number_of_states(&self) -> usize {
        self.states
    }

    fn current_state(&self) -> Option<usize> {
        match self.value.load(Ordering::Acquire) {
            NO_SELECTION => None,
            state => Some(state),
        }
    }
}

impl fmt::Debug for ManualSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualSelector")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("current", &self.current_state())
            .finish()
    }
}

/// Two-state selector driven by a boolean input: `false` is state 0,
/// `true` is state 1.
pub struct BinarySelector {
    name: String,
    input: Box<dyn Fn() -> bool + Send + Sync>,
    dependencies: UnitMap,
}

impl BinarySelector {
    pub fn new(
        name: impl Into<String>,
        input: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        Ok(Self {
            name,
            input: Box::new(input),
            dependencies: UnitMap::new(),
        })
    }

    /// Declare the unit the input is read from.
    pub fn with_dependency(mut self, dep: UnitRef) -> Self {
        self.dependencies.insert(dep);
        self
    }
}

impl Unit for BinarySelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> UnitMap {
        self.dependencies.clone()
    }
}

impl Selector for BinarySelector {
    fn number_of_states(&self) -> usize {
        2
    }

    fn current_state(&self) -> Option<usize> {
        Some(usize::from((self.input)()))
    }
}

impl fmt::Debug for BinarySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinarySelector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ManualSelector: Send, Sync);
static_assertions::assert_impl_all!(BinarySelector: Send, Sync);

// ─── Tests ──────────────────────────────────────────────────────────
