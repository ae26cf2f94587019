//! Execution contexts: the identity that ownership is granted to.
//!
//! Every mutating call into the core names the calling context explicitly.
//! A context is usually one OS thread, but nothing requires that; tests
//! create several contexts on a single thread.
//!
//! A context dies when [`ExecutionContext::terminate`] is called or when
//! every strong handle to it has been dropped. Ownership guards keep only a
//! [`WeakContext`], so a dead owner never blocks acquisition.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use bread_common::consts::ANONYMOUS_CONTEXT_LABEL;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

struct ContextInner {
    id: ContextId,
    label: String,
    alive: AtomicBool,
    interrupted: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable handle to one execution context.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    /// Create a live context.
    pub fn new(label: impl Into<String>) -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(ContextInner {
                id,
                label: label.into(),
                alive: AtomicBool::new(true),
                interrupted: Mutex::new(false),
                wake: Condvar::new(),
            }),
        }
    }

    /// Create a live context labelled `"anonymous"`.
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_CONTEXT_LABEL)
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Mark the context dead. Irreversible.
    pub fn terminate(&self) {
        self.inner.alive.store(false, Ordering::Release);
        self.inner.wake.notify_all();
    }

    /// Raise the interruption flag and wake any interruptible sleep.
    pub fn interrupt(&self) {
        let mut flag = self.inner.interrupted.lock();
        *flag = true;
        self.inner.wake.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *self.inner.interrupted.lock()
    }

    /// Lower the interruption flag, returning its previous value.
    pub fn clear_interrupt(&self) -> bool {
        std::mem::replace(&mut *self.inner.interrupted.lock(), false)
    }

    /// Sleep for `duration` unless interrupted.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the context
    /// was (or already is) interrupted. The flag is left raised.
    pub fn sleep_interruptible(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut flag = self.inner.interrupted.lock();
        while !*flag {
            if self.inner.wake.wait_until(&mut flag, deadline).timed_out() {
                return !*flag;
            }
        }
        false
    }

    /// Guard that terminates this context when dropped, including on unwind.
    pub fn exit_guard(&self) -> ExitGuard {
        ExitGuard { ctx: self.clone() }
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl PartialEq for ExecutionContext {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ExecutionContext {}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.label())
    }
}

/// Non-owning reference to a context, held by ownership guards.
#[derive(Clone)]
pub struct WeakContext {
    id: ContextId,
    inner: Weak<ContextInner>,
}

impl WeakContext {
    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// `false` once the context was terminated or fully dropped.
    pub fn is_alive(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.alive.load(Ordering::Acquire))
    }

    pub fn upgrade(&self) -> Option<ExecutionContext> {
        self.inner.upgrade().map(|inner| ExecutionContext { inner })
    }
}

impl fmt::Debug for WeakContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContext")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Terminates its context on drop.
#[must_use = "the context is terminated as soon as the guard is dropped"]
pub struct ExitGuard {
    ctx: ExecutionContext,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.ctx.terminate();
    }
}

static_assertions::assert_impl_all!(ExecutionContext: Send, Sync, Clone);
static_assertions::assert_impl_all!(WeakContext: Send, Sync);

// ─── Tests ──────────────────────────────────────────────────────────
