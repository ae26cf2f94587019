//! Acquire or release a unit together with its ownable dependencies.
//!
//! Used by the runner and by every composition strategy when a task is
//! handed to (or taken from) an execution context.

use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::error::GraphError;
use crate::ownership::OwnershipGuard;
use crate::unit::Unit;

/// Outcome of [`acquire_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acquisition {
    /// Units now owned by the requester.
    pub acquired: Vec<String>,
    /// Units held by another live context.
    pub denied: Vec<String>,
}

impl Acquisition {
    /// Every ownable unit was acquired.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.denied.is_empty()
    }

    fn record(&mut self, name: &str, guard: &OwnershipGuard, ctx: &ExecutionContext, force: bool) {
        if guard.acquire(Some(ctx), force) {
            self.acquired.push(name.to_string());
        } else {
            self.denied.push(name.to_string());
        }
    }
}

/// Acquire `unit` and every ownable unit in its extended dependencies for `ctx`.
///
/// Denied units are reported, not treated as an error: ownership is the
/// arbiter and the caller decides what a partial acquisition means.
pub fn acquire_all<U: Unit + ?Sized>(
    unit: &U,
    ctx: &ExecutionContext,
    force: bool,
) -> Result<Acquisition, GraphError> {
    let dependencies = unit.extended_dependencies()?;
    let mut acquisition = Acquisition::default();

    if let Some(guard) = unit.ownership() {
        acquisition.record(unit.name(), guard, ctx, force);
    }
    for dep in dependencies.ownables() {
        if let Some(guard) = dep.ownership() {
            acquisition.record(dep.name(), guard, ctx, force);
        }
    }

    if acquisition.is_complete() {
        debug!(
            unit = unit.name(),
            context = %ctx,
            count = acquisition.acquired.len(),
            "acquired"
        );
    } else {
        warn!(
            unit = unit.name(),
            context = %ctx,
            denied = ?acquisition.denied,
            "acquisition incomplete"
        );
    }
    Ok(acquisition)
}

/// Release `unit` and every ownable unit in its extended dependencies held by `ctx`.
///
/// Units owned by other contexts are left alone.
pub fn release_all<U: Unit + ?Sized>(unit: &U, ctx: &ExecutionContext) -> Result<(), GraphError> {
    let dependencies = unit.extended_dependencies()?;

    let guards = unit
        .ownership()
        .into_iter()
        .chain(dependencies.ownables().filter_map(|dep| dep.ownership()));
    for guard in guards {
        if let Err(err) = guard.release(Some(ctx)) {
            warn!(unit = guard.unit(), error = %err, "release failed");
        }
    }

    debug!(unit = unit.name(), context = %ctx, "released");
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
