//! Diagnostic sink for unit notifications.
//!
//! Units report four kinds of structured notifications: initialized, got
//! (a query answered), set (state changed) and error, plus free-form
//! lifecycle events. The sink is injected; nothing in the core may behave
//! differently depending on which sink is installed.
//!
//! | Sink            | Purpose                                    |
//! |-----------------|--------------------------------------------|
//! | `TracingSink`   | Default. Forwards to `tracing` macros.     |
//! | `NullSink`      | Drops everything, skips formatting.        |
//! | `FanoutSink`    | Forwards to several sinks.                 |
//! | `SelectableSink`| Forwards to the currently selected sink.   |
//! | `RecordingSink` | Keeps events in memory for inspection.     |

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

/// Kind of a diagnostic notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A unit finished construction.
    Initialized,
    /// A query was answered.
    Got,
    /// Observable state changed.
    Set,
    /// Lifecycle step (starting, updated, cleaned, hand-off).
    Event,
    /// A failure was contained or an access was refused.
    Error,
}

/// One notification, borrowed for the duration of the `record` call.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticEvent<'a> {
    /// Name of the reporting unit.
    pub unit: &'a str,
    /// Notification kind.
    pub kind: DiagnosticKind,
    /// Short, stable message ("acquired", "starting", ...).
    pub message: &'a str,
    /// Formatted detail, may be empty.
    pub detail: &'a str,
}

/// Receiver of diagnostic notifications.
pub trait DiagnosticSink: Send + Sync {
    /// Whether events of `kind` are wanted. Returning `false` skips
    /// formatting of the detail.
    fn enabled(&self, _kind: DiagnosticKind) -> bool {
        true
    }

    /// Handle one event.
    fn record(&self, event: &DiagnosticEvent<'_>);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiagnosticEvent<'_>) {
        let DiagnosticEvent {
            unit,
            kind,
            message,
            detail,
        } = *event;
        match kind {
            DiagnosticKind::Got => trace!(unit, detail, "got {message}"),
            DiagnosticKind::Initialized => debug!(unit, detail, "initialized {message}"),
            DiagnosticKind::Set => debug!(unit, detail, "set {message}"),
            DiagnosticKind::Event => debug!(unit, detail, "{message}"),
            DiagnosticKind::Error => warn!(unit, detail, "{message}"),
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn enabled(&self, _kind: DiagnosticKind) -> bool {
        false
    }

    fn record(&self, _event: &DiagnosticEvent<'_>) {}
}

/// Forwards to every contained sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl FanoutSink {
    /// Create a fan-out over `sinks`.
    pub fn new(sinks: Vec<Arc<dyn DiagnosticSink>>) -> Self {
        Self { sinks }
    }
}

impl DiagnosticSink for FanoutSink {
    fn enabled(&self, kind: DiagnosticKind) -> bool {
        self.sinks.iter().any(|s| s.enabled(kind))
    }

    fn record(&self, event: &DiagnosticEvent<'_>) {
        for sink in &self.sinks {
            if sink.enabled(event.kind) {
                sink.record(event);
            }
        }
    }
}

type SelectFn = Box<dyn Fn() -> Option<usize> + Send + Sync>;

/// Forwards to one of several sinks, picked on every event.
///
/// `select` returns the index of the sink to use. `None`, or an index with
/// no sink behind it, routes to the unselected sink. `select` runs inside
/// the emitting call and must not report diagnostics itself.
pub struct SelectableSink {
    select: SelectFn,
    unselected: Arc<dyn DiagnosticSink>,
    sinks: Vec<Arc<dyn DiagnosticSink>>,
    enabled: AtomicBool,
    verbose: AtomicBool,
}

impl SelectableSink {
    /// Enabled and verbose.
    pub fn new(
        select: impl Fn() -> Option<usize> + Send + Sync + 'static,
        unselected: Arc<dyn DiagnosticSink>,
        sinks: Vec<Arc<dyn DiagnosticSink>>,
    ) -> Self {
        Self {
            select: Box::new(select),
            unselected,
            sinks,
            enabled: AtomicBool::new(true),
            verbose: AtomicBool::new(true),
        }
    }

    /// Number of selectable sinks, the unselected one not included.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// A disabled sink drops everything.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Without verbosity, `Got` notifications are dropped.
    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    fn passes(&self, kind: DiagnosticKind) -> bool {
        self.is_enabled() && (kind != DiagnosticKind::Got || self.is_verbose())
    }

    fn selected(&self) -> &Arc<dyn DiagnosticSink> {
        (self.select)()
            .and_then(|i| self.sinks.get(i))
            .unwrap_or(&self.unselected)
    }
}

impl DiagnosticSink for SelectableSink {
    fn enabled(&self, kind: DiagnosticKind) -> bool {
        self.passes(kind) && self.selected().enabled(kind)
    }

    fn record(&self, event: &DiagnosticEvent<'_>) {
        if !self.passes(event.kind) {
            return;
        }
        let sink = self.selected();
        if sink.enabled(event.kind) {
            sink.record(event);
        }
    }
}

impl fmt::Debug for SelectableSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectableSink")
            .field("sinks", &self.sinks.len())
            .field("enabled", &self.is_enabled())
            .field("verbose", &self.is_verbose())
            .finish_non_exhaustive()
    }
}

/// Owned copy of a recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub unit: String,
    pub kind: DiagnosticKind,
    pub message: String,
    pub detail: String,
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// `(unit, message)` pairs of every event whose unit is in `units`.
    pub fn trail(&self, units: &[&str]) -> Vec<(String, String)> {
        self.events
            .lock()
            .iter()
            .filter(|e| units.contains(&e.unit.as_str()))
            .map(|e| (e.unit.clone(), e.message.clone()))
            .collect()
    }

    /// Number of events of `kind`.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: &DiagnosticEvent<'_>) {
        self.events.lock().push(RecordedEvent {
            unit: event.unit.to_string(),
            kind: event.kind,
            message: event.message.to_string(),
            detail: event.detail.to_string(),
        });
    }
}

/// Cheap, cloneable handle to the installed sink.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    /// Wrap an arbitrary sink.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Handle forwarding to `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Handle that drops everything.
    pub fn null() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn initialized(&self, unit: &str, detail: impl fmt::Debug) {
        self.emit(unit, DiagnosticKind::Initialized, "unit", format_args!("{detail:?}"));
    }

    pub fn got(&self, unit: &str, what: &str, value: impl fmt::Debug) {
        self.emit(unit, DiagnosticKind::Got, what, format_args!("{value:?}"));
    }

    pub fn set(&self, unit: &str, what: &str, value: impl fmt::Debug) {
        self.emit(unit, DiagnosticKind::Set, what, format_args!("{value:?}"));
    }

    pub fn event(&self, unit: &str, message: &str, detail: impl fmt::Debug) {
        self.emit(unit, DiagnosticKind::Event, message, format_args!("{detail:?}"));
    }

    pub fn error(&self, unit: &str, message: &str, err: impl fmt::Display) {
        self.emit(unit, DiagnosticKind::Error, message, format_args!("{err}"));
    }

    fn emit(&self, unit: &str, kind: DiagnosticKind, message: &str, detail: fmt::Arguments<'_>) {
        if !self.sink.enabled(kind) {
            return;
        }
        let detail = detail.to_string();
        self.sink.record(&DiagnosticEvent {
            unit,
            kind,
            message,
            detail: &detail,
        });
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Diagnostics: Send, Sync, Clone);

// ─── Tests ──────────────────────────────────────────────────────────
