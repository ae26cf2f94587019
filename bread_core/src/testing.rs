//! Unit self-tests.
//!
//! A [`Testable`] unit knows how to check itself on the bench. [`run_test`]
//! takes the unit and its ownable closure away from whoever holds them,
//! runs the check, then releases everything again. [`TestSuite`] collects
//! testable units by name.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{info, warn};

use crate::context::ExecutionContext;
use crate::error::TaskFailure;
use crate::ownership::{acquire_all, release_all};
use crate::unit::Unit;

/// Verdict of one self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    /// The unit works.
    Passed,
    /// The unit ran its check and does not work.
    Failed,
    /// The check could not be carried out: the unit or one of its
    /// dependencies could not be taken, or the check panicked.
    Errored,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
        })
    }
}

/// Unit able to check itself.
pub trait Testable: Unit {
    /// Exercise the unit. Called with the unit and every ownable unit it
    /// depends on owned by `ctx`.
    fn self_test(&self, ctx: &ExecutionContext) -> TestStatus;
}

/// Run the self-test of `unit` on `ctx`.
///
/// The unit and its ownable closure are acquired with force before the
/// test and released afterwards, also when the test panics. Whoever held
/// them before does not get them back.
pub fn run_test<T: Testable + ?Sized>(unit: &T, ctx: &ExecutionContext) -> TestStatus {
    let acquisition = match acquire_all(unit, ctx, true) {
        Ok(acquisition) => acquisition,
        Err(err) => {
            warn!(unit = unit.name(), error = %err, "test not run");
            return TestStatus::Errored;
        }
    };

    let status = if acquisition.is_complete() {
        panic::catch_unwind(AssertUnwindSafe(|| unit.self_test(ctx))).unwrap_or_else(|payload| {
            let failure = TaskFailure::from_panic(&*payload);
            warn!(unit = unit.name(), error = %failure, "test aborted");
            TestStatus::Errored
        })
    } else {
        warn!(unit = unit.name(), denied = ?acquisition.denied, "test not run");
        TestStatus::Errored
    };

    if let Err(err) = release_all(unit, ctx) {
        warn!(unit = unit.name(), error = %err, "release after test failed");
    }
    info!(unit = unit.name(), context = %ctx, %status, "test finished");
    status
}

/// Testable units by name.
#[derive(Default)]
pub struct TestSuite {
    units: BTreeMap<String, Arc<dyn Testable>>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `unit`. A name already present keeps its first unit.
    pub fn insert(&mut self, unit: Arc<dyn Testable>) -> bool {
        let name = unit.name().to_string();
        if self.units.contains_key(&name) {
            return false;
        }
        self.units.insert(name, unit);
        true
    }

    pub fn with(mut self, unit: Arc<dyn Testable>) -> Self {
        self.insert(unit);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Look `name` up as given, then lowercased.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Testable>> {
        self.units
            .get(name)
            .or_else(|| self.units.get(&name.to_lowercase()))
    }

    /// Test the unit called `name`. `None` if there is no such unit.
    pub fn run(&self, name: &str, ctx: &ExecutionContext) -> Option<TestStatus> {
        self.get(name).map(|unit| run_test(unit.as_ref(), ctx))
    }

    /// Test every unit, in name order.
    pub fn run_all(&self, ctx: &ExecutionContext) -> Vec<(String, TestStatus)> {
        self.units
            .iter()
            .map(|(name, unit)| (name.clone(), run_test(unit.as_ref(), ctx)))
            .collect()
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
