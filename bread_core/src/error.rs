//! Error types of the coordination core.
//!
//! Ownership and task errors signal caller misuse and are returned to the
//! immediate caller. Hook failures ([`TaskFailure`]) never leave a task's
//! lifecycle methods; they are logged and turned into a terminal state.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::context::ContextId;

fn describe(ctx: &Option<ContextId>) -> String {
    match ctx {
        Some(id) => id.to_string(),
        None => "nobody".to_string(),
    }
}

/// Violations of the ownership protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    /// Release requested without a live requester.
    #[error("cannot release `{unit}` without a live owner context")]
    InvalidOwner {
        /// Unit whose release was requested.
        unit: String,
    },

    /// Mutating call from a context that neither owns the unit nor finds it unowned.
    #[error("access to `{unit}` denied for {} (owned by {})", describe(.requester), describe(.owner))]
    AccessDenied {
        /// Unit that refused access.
        unit: String,
        /// Context that made the call.
        requester: Option<ContextId>,
        /// Live owner at the time of the call.
        owner: Option<ContextId>,
    },
}

/// Errors returned by `Task::start`, `update` and `clean`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// `start` called while a run is in progress.
    #[error("task `{task}` is not ready to start")]
    NotReady { task: String },

    /// `update` called before `start` or after `clean`.
    #[error("task `{task}` has not been started")]
    NotStarted { task: String },
}

/// Dependency graph errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// `unit` was reached again while still on the traversal path.
    #[error("cyclic dependency on `{unit}`: {}", .path.join(" -> "))]
    CyclicDependency { unit: String, path: Vec<String> },
}

/// Construction-time invariant violations. Nothing is built when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unit name must not be empty")]
    EmptyName,

    #[error("`{unit}` needs at least one child task")]
    NoChildren { unit: String },

    #[error("selector `{selector}` has {states} states but {choices} choices were supplied")]
    StateCountMismatch {
        selector: String,
        states: usize,
        choices: usize,
    },
}

/// Failure raised by a task hook.
#[derive(Debug)]
pub struct TaskFailure {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TaskFailure {
    /// Failure carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Failure wrapping an underlying error.
    pub fn from_error(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Failure standing for a hook that panicked with `payload`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string payload");
        Self::msg(format!("hook panicked: {detail}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for TaskFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<OwnershipError> for TaskFailure {
    fn from(err: OwnershipError) -> Self {
        Self::from_error("ownership", err)
    }
}

impl From<TaskError> for TaskFailure {
    fn from(err: TaskError) -> Self {
        Self::from_error("child task", err)
    }
}

impl From<GraphError> for TaskFailure {
    fn from(err: GraphError) -> Self {
        Self::from_error("dependency graph", err)
    }
}

/// Errors of driven execution.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Task(#[from] TaskError),

    /// The runner thread unwound instead of returning.
    #[error("runner thread for `{task}` panicked")]
    Panicked { task: String },
}

// ─── Tests ──────────────────────────────────────────────────────────
