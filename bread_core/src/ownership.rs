//! Exclusive, context-scoped access to units.
//!
//! ```text
//!            acquire(T)               acquire(U, force)
//!  unowned ─────────────► owned(T) ──────────────────► owned(U)
//!     ▲                      │
//!     └──── release(T) ──────┘   (or T terminates)
//! ```
//!
//! Acquisition never blocks: it either succeeds immediately or is refused.

pub mod guard;
pub mod handoff;

pub use guard::OwnershipGuard;
pub use handoff::{Acquisition, acquire_all, release_all};
