//! Task state and per-poll progress.

/// Result of one `update()` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Progress {
    /// Keep polling.
    Continue,
    /// Completed successfully.
    Done,
    /// Completed unsuccessfully.
    Failed,
}

impl Progress {
    /// `Done` or `Failed`.
    #[inline]
    pub const fn is_done(self) -> bool {
        !matches!(self, Self::Continue)
    }

    #[inline]
    pub const fn from_done(done: bool) -> Self {
        if done { Self::Done } else { Self::Continue }
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TaskState {
    #[default]
    NotStarted = 0,
    Running = 1,
    Finished = 2,
    /// Cleaned while still running.
    Interrupted = 3,
    Errored = 4,
}

/// Lifecycle event applied to a [`TaskState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Started,
    Polled(Progress),
    Cleaned,
}

impl TaskState {
    /// State after `event`.
    ///
    /// Events that do not apply leave the state unchanged; the phase checks
    /// in `Task` keep them from happening in the first place.
    pub const fn next(self, event: TaskEvent) -> Self {
        use TaskEvent::*;
        use TaskState::*;

        match (self, event) {
            (_, Started) => Running,
            (Running, Polled(Progress::Done)) => Finished,
            (Running, Polled(Progress::Failed)) => Errored,
            (Running, Cleaned) => Interrupted,
            (state, _) => state,
        }
    }

    /// Finished, Interrupted or Errored.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Interrupted | Self::Errored)
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`as_u8`](Self::as_u8). Unknown values read as `NotStarted`.
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::Finished,
            3 => Self::Interrupted,
            4 => Self::Errored,
            _ => Self::NotStarted,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
