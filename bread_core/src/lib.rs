//! # BREAD Core
//!
//! Coordination layer for composing a robot control program out of
//! independent units that may be reached from several threads but must
//! never be driven by two of them at once.
//!
//! ## Layers
//!
//! 1. **Unit graph** ([`unit`]): named nodes, direct and transitive
//!    dependencies, cycle detection.
//! 2. **Ownership** ([`ownership`]): exclusive, revocable access granted to
//!    an [`ExecutionContext`](context::ExecutionContext).
//! 3. **Tasks** ([`task`]): pollable start / update / clean state machines
//!    that check ownership on every lifecycle call.
//! 4. **Runner** ([`runner`]): acquire, start, poll, clean, release.
//! 5. **Composition** ([`compose`]): aggregate and selectable tasks that
//!    hand ownership between their children.
//!
//! Units that can check themselves implement [`testing::Testable`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bread_core::prelude::*;
//!
//! let wheel = Arc::new(OwnableUnit::new("wheel").unwrap());
//! let mut turns = 0;
//! let spin = FnTask::new(move |_| {
//!     turns += 1;
//!     Ok(Progress::from_done(turns == 2))
//! })
//! .depends_on(UnitRef::plain(wheel.clone()))
//! .into_procedure("spin")
//! .unwrap();
//!
//! let ctx = ExecutionContext::new("main");
//! let options = RunOptions::default().with_update_delay(std::time::Duration::from_millis(1));
//! let summary = run(&spin, &ctx, &options).unwrap();
//! assert_eq!(summary.outcome, Some(Progress::Done));
//! assert!(wheel.guard().is_owned_by(None));
//! ```

pub mod compose;
pub mod context;
pub mod error;
pub mod ownership;
pub mod runner;
pub mod selector;
pub mod task;
pub mod testing;
pub mod unit;

/// Common re-exports.
pub mod prelude {
    pub use crate::compose::{Aggregate, ContinuousSelectable, SingleShotSelectable, Slot};
    pub use crate::context::{ContextId, ExecutionContext};
    pub use crate::error::{
        ConfigurationError, GraphError, OwnershipError, RunError, TaskError, TaskFailure,
    };
    pub use crate::ownership::{Acquisition, OwnershipGuard, acquire_all, release_all};
    pub use crate::runner::{RunOptions, RunSummary, RunnerHandle, TaskRunner, run};
    pub use crate::selector::{BinarySelector, ManualSelector, Selector};
    pub use crate::task::{
        FnTask, HookContext, InertTask, Procedure, Progress, Task, TaskHooks, TaskState,
    };
    pub use crate::testing::{TestStatus, TestSuite, Testable, run_test};
    pub use crate::unit::{Capabilities, OwnableUnit, SimpleUnit, Unit, UnitMap, UnitRef};
}
