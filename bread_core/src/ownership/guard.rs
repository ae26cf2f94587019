//! Per-unit ownership guard.

use parking_lot::Mutex;
use std::fmt;

use bread_common::diagnostics::Diagnostics;

use crate::context::{ContextId, ExecutionContext, WeakContext};
use crate::error::OwnershipError;

/// Owner slot of one ownable unit.
///
/// All mutators are serialized by an internal lock. Queries are always
/// permitted, whoever asks.
pub struct OwnershipGuard {
    unit: String,
    owner: Mutex<Option<WeakContext>>,
    diagnostics: Diagnostics,
}

#[inline]
fn live_owner(slot: &Option<WeakContext>) -> Option<ContextId> {
    slot.as_ref().filter(|w| w.is_alive()).map(WeakContext::id)
}

impl OwnershipGuard {
    pub fn new(unit: impl Into<String>, diagnostics: Diagnostics) -> Self {
        let unit = unit.into();
        diagnostics.initialized(&unit, "ownership guard");
        Self {
            unit,
            owner: Mutex::new(None),
            diagnostics,
        }
    }

    /// Same guard, current owner included, reporting to `diagnostics`.
    pub fn with_diagnostics(self, diagnostics: Diagnostics) -> Self {
        diagnostics.initialized(&self.unit, "ownership guard");
        Self {
            unit: self.unit,
            owner: self.owner,
            diagnostics,
        }
    }

    /// Name of the guarded unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Current live owner. A terminated owner reads as `None`.
    pub fn owner(&self) -> Option<ContextId> {
        live_owner(&self.owner.lock())
    }

    /// `None` asks whether the unit is unowned.
    pub fn is_owned_by(&self, ctx: Option<&ExecutionContext>) -> bool {
        let owner = self.owner();
        self.diagnostics.got(&self.unit, "owner", owner);
        owner == ctx.map(ExecutionContext::id)
    }

    /// Take ownership for `requester`.
    ///
    /// The owner changes only if the unit is unowned (or `force` is set) and
    /// `requester` is not already the owner. Returns whether `requester`
    /// owns the unit afterwards. `None` with `force` clears the owner.
    /// A terminated requester never becomes owner.
    pub fn acquire(&self, requester: Option<&ExecutionContext>, force: bool) -> bool {
        let requester_id = requester.map(ExecutionContext::id);
        if requester.is_some_and(|ctx| !ctx.is_alive()) {
            self.diagnostics
                .error(&self.unit, "acquisition by dead context", describe(requester_id));
            return false;
        }

        let (previous, owned) = {
            let mut slot = self.owner.lock();
            let current = live_owner(&slot);
            if current == requester_id {
                (current, true)
            } else if current.is_none() || force {
                *slot = requester.map(ExecutionContext::downgrade);
                (current, true)
            } else {
                (current, false)
            }
        };

        if !owned {
            self.diagnostics.error(
                &self.unit,
                "acquisition denied",
                format_args!(
                    "{} requested, {} owns",
                    describe(requester_id),
                    describe(previous)
                ),
            );
        } else if previous != requester_id {
            self.diagnostics.set(&self.unit, "owner", requester_id);
        }
        owned
    }

    /// Give up ownership held by `requester`.
    ///
    /// Does nothing if `requester` is not the owner.
    ///
    /// # Errors
    ///
    /// `OwnershipError::InvalidOwner` for `None` or a terminated requester;
    /// use a forced `acquire(None, true)` to clear ownership for nobody.
    pub fn release(&self, requester: Option<&ExecutionContext>) -> Result<(), OwnershipError> {
        let Some(ctx) = requester.filter(|ctx| ctx.is_alive()) else {
            let err = OwnershipError::InvalidOwner {
                unit: self.unit.clone(),
            };
            self.diagnostics.error(&self.unit, "release refused", &err);
            return Err(err);
        };

        let released = {
            let mut slot = self.owner.lock();
            if live_owner(&slot) == Some(ctx.id()) {
                *slot = None;
                true
            } else {
                false
            }
        };
        if released {
            self.diagnostics.set(&self.unit, "owner", None::<ContextId>);
        }
        Ok(())
    }

    /// Owned by `ctx`, or owned by nobody.
    pub fn is_accessible_from(&self, ctx: Option<&ExecutionContext>) -> bool {
        let owner = self.owner();
        owner.is_none() || owner == ctx.map(ExecutionContext::id)
    }

    /// Gate for mutating operations.
    ///
    /// # Errors
    ///
    /// `OwnershipError::AccessDenied` naming the requester and the owner.
    pub fn check_access(&self, ctx: &ExecutionContext) -> Result<(), OwnershipError> {
        let owner = self.owner();
        if owner.is_none() || owner == Some(ctx.id()) {
            return Ok(());
        }
        let err = OwnershipError::AccessDenied {
            unit: self.unit.clone(),
            requester: Some(ctx.id()),
            owner,
        };
        self.diagnostics.error(&self.unit, "access denied", &err);
        Err(err)
    }
}

fn describe(ctx: Option<ContextId>) -> String {
    ctx.map_or_else(|| "nobody".to_string(), |id| id.to_string())
}

impl fmt::Debug for OwnershipGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipGuard")
            .field("unit", &self.unit)
            .field("owner", &self.owner())
            .finish()
    }
}

static_assertions::assert_impl_all!(OwnershipGuard: Send, Sync);

// ─── Tests ──────────────────────────────────────────────────────────
