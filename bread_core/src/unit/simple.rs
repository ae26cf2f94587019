//! Reference unit implementations.
//!
//! [`SimpleUnit`] is a bare named node. [`OwnableUnit`] adds an ownership
//! guard and is what a driver embeds when it wants ownership-mediated
//! access to its actuation calls.

use bread_common::diagnostics::Diagnostics;

use super::{Unit, UnitMap, UnitRef};
use crate::context::ExecutionContext;
use crate::error::{ConfigurationError, OwnershipError};
use crate::ownership::OwnershipGuard;

/// Plain named node.
#[derive(Debug)]
pub struct SimpleUnit {
    name: String,
    dependencies: UnitMap,
}

impl SimpleUnit {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        Ok(Self {
            name,
            dependencies: UnitMap::new(),
        })
    }

    pub fn with_dependency(mut self, dep: UnitRef) -> Self {
        self.dependencies.insert(dep);
        self
    }
}

impl Unit for SimpleUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> UnitMap {
        self.dependencies.clone()
    }
}

/// Named node with an ownership guard.
#[derive(Debug)]
pub struct OwnableUnit {
    name: String,
    dependencies: UnitMap,
    guard: OwnershipGuard,
}

impl OwnableUnit {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::new_with_diagnostics(name, Diagnostics::default())
    }

    pub fn new_with_diagnostics(
        name: impl Into<String>,
        diagnostics: Diagnostics,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        let guard = OwnershipGuard::new(name.clone(), diagnostics);
        Ok(Self {
            name,
            dependencies: UnitMap::new(),
            guard,
        })
    }

    pub fn with_dependency(mut self, dep: UnitRef) -> Self {
        self.dependencies.insert(dep);
        self
    }

    /// Replace the diagnostics handle. The current owner is kept.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.guard = self.guard.with_diagnostics(diagnostics);
        self
    }

    pub fn guard(&self) -> &OwnershipGuard {
        &self.guard
    }

    /// Gate for a mutating operation: `Ok` if `ctx` may act on this unit.
    pub fn check_access(&self, ctx: &ExecutionContext) -> Result<(), OwnershipError> {
        self.guard.check_access(ctx)
    }
}

impl Unit for OwnableUnit {
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

// ─── Tests ──────────────────────────────────────────────────────────
