//! Units and the dependency graph.
//!
//! A unit is a named node that declares the units it directly depends on.
//! Graph nodes are stored as [`UnitRef`], a variant tagged with what the
//! node can do, so composition code can pick tasks, selectors and ownable
//! units out of a dependency set without runtime type inspection.

pub mod closure;
pub mod map;
pub mod simple;

use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

pub use map::UnitMap;
pub use simple::{OwnableUnit, SimpleUnit};

use crate::error::GraphError;
use crate::ownership::OwnershipGuard;
use crate::selector::Selector;
use crate::task::Task;

bitflags! {
    /// What a graph node supports beyond being a named unit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Has an ownership guard.
        const OWNABLE  = 0b0001;
        /// Implements the task lifecycle.
        const TASK     = 0b0010;
        /// Produces a selection signal.
        const SELECTOR = 0b0100;
    }
}

/// Named node of the dependency graph.
///
/// # Contract
///
/// - `name()` is stable and non-empty.
/// - `dependencies()` returns a fresh copy on every call. It must not
///   change over the unit's lifetime.
/// - Neither method may call back into `extended_dependencies()` of the
///   same unit.
pub trait Unit: Send + Sync {
    fn name(&self) -> &str;

    /// Direct dependencies.
    fn dependencies(&self) -> UnitMap;

    /// Ownership guard, for units that mediate exclusive access.
    fn ownership(&self) -> Option<&OwnershipGuard> {
        None
    }

    /// Transitive closure of [`dependencies`](Unit::dependencies).
    ///
    /// # Errors
    ///
    /// `GraphError::CyclicDependency` if the graph reachable from this unit
    /// contains a cycle, including a unit that depends on itself.
    fn extended_dependencies(&self) -> Result<UnitMap, GraphError> {
        closure::extended_dependencies(self)
    }
}

/// Capability-tagged shared reference to a graph node.
#[derive(Clone)]
pub enum UnitRef {
    Plain(Arc<dyn Unit>),
    Task(Arc<dyn Task>),
    Selector(Arc<dyn Selector>),
}

impl UnitRef {
    pub fn plain(unit: Arc<dyn Unit>) -> Self {
        Self::Plain(unit)
    }

    pub fn task(task: Arc<dyn Task>) -> Self {
        Self::Task(task)
    }

    pub fn selector(selector: Arc<dyn Selector>) -> Self {
        Self::Selector(selector)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Plain(u) => u.name(),
            Self::Task(t) => t.name(),
            Self::Selector(s) => s.name(),
        }
    }

    pub fn dependencies(&self) -> UnitMap {
        match self {
            Self::Plain(u) => u.dependencies(),
            Self::Task(t) => t.dependencies(),
            Self::Selector(s) => s.dependencies(),
        }
    }

    pub fn ownership(&self) -> Option<&OwnershipGuard> {
        match self {
            Self::Plain(u) => u.ownership(),
            Self::Task(t) => t.ownership(),
            Self::Selector(s) => s.ownership(),
        }
    }

    pub fn extended_dependencies(&self) -> Result<UnitMap, GraphError> {
        match self {
            Self::Plain(u) => u.extended_dependencies(),
            Self::Task(t) => t.extended_dependencies(),
            Self::Selector(s) => s.extended_dependencies(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut caps = match self {
            Self::Plain(_) => Capabilities::empty(),
            Self::Task(_) => Capabilities::TASK,
            Self::Selector(_) => Capabilities::SELECTOR,
        };
        if self.ownership().is_some() {
            caps |= Capabilities::OWNABLE;
        }
        caps
    }

    pub fn as_task(&self) -> Option<&Arc<dyn Task>> {
        match self {
            Self::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> Option<&Arc<dyn Selector>> {
        match self {
            Self::Selector(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRef")
            .field("name", &self.name())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

static_assertions::assert_impl_all!(UnitRef: Send, Sync, Clone);

// ─── Tests ──────────────────────────────────────────────────────────
