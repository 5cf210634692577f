//! Typed error kinds surfaced at the mutation and report boundaries.
//!
//! All three enums travel inside `anyhow::Error` through the database layer
//! and are downcast where a caller needs to react to the specific kind (CLI
//! output, tests). None of them is fatal: the caller reports the message and
//! may retry with a different operation.

use crate::types::TaskStatus;
use thiserror::Error;

/// Rejected lifecycle transitions.
///
/// A failed transition leaves the task untouched: status and ledger are
/// written in the same transaction or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("task is already in progress")]
    AlreadyInProgress,

    #[error("task has not been started")]
    TaskNotStarted,

    #[error("completed task cannot be restarted")]
    CannotRestartCompleted,

    #[error("completed task cannot be marked overdue")]
    CannotOverdueCompleted,

    #[error("task in status '{0}' cannot be reopened")]
    IllegalReopen(TaskStatus),

    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// Rejected report requests. No aggregate is produced or written on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("no tasks matched the report parameters")]
    EmptyResultSet,

    #[error("invalid date range: 'from' is after 'to'")]
    InvalidDateRange,

    #[error("unknown project or assignee: {0}")]
    UnknownProjectOrAssignee(String),
}

/// Violations of construction invariants. The entity is never created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("name must not be empty")]
    EmptyName,
}
