//! The task lifecycle state machine.
//!
//! Legality is encoded as one exhaustive match over (status, operation), so
//! the whole transition matrix is visible in a single place and adding a
//! state is a local change the compiler polices. The functions here are
//! pure; `db::tasks` applies a [`Decision`] inside a transaction, coupling
//! the status write to the ledger append.

use crate::error::TransitionError;
use crate::types::TaskStatus;

/// A requested lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Complete,
    MarkOverdue,
    Reopen,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Complete => "complete",
            Operation::MarkOverdue => "mark_overdue",
            Operation::Reopen => "reopen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Operation::Start),
            "complete" => Some(Operation::Complete),
            "mark_overdue" => Some(Operation::MarkOverdue),
            "reopen" => Some(Operation::Reopen),
            _ => None,
        }
    }
}

/// Timestamp side effect of an applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Stamp `started_at` with the transition time.
    SetStartedAt,
    /// Stamp `started_at` only when it has never been set.
    SetStartedAtIfUnset,
    /// Stamp `completed_at` with the transition time.
    SetCompletedAt,
    /// Clear `completed_at` (explicit reopen only).
    ClearCompletedAt,
    None,
}

/// Outcome of a legal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Change status and append one ledger entry.
    Move { to: TaskStatus, effect: Effect },
    /// Success with no status change and no ledger entry.
    Noop,
    /// Overdue -> Overdue: no status change, but the repeated check is still
    /// appended to the ledger so sweeps leave an audit trail.
    StillOverdue,
}

/// Validate `op` against the current status.
///
/// Failures never have side effects; the caller applies successes.
pub fn decide(status: TaskStatus, op: Operation) -> Result<Decision, TransitionError> {
    use Operation::*;
    use TaskStatus::*;

    match (status, op) {
        (NotStarted, Start) => Ok(Decision::Move {
            to: InProgress,
            effect: Effect::SetStartedAt,
        }),
        (NotStarted, Complete) => Err(TransitionError::TaskNotStarted),
        (NotStarted, MarkOverdue) => Ok(Decision::Move {
            to: Overdue,
            effect: Effect::None,
        }),
        (NotStarted, Reopen) => Ok(Decision::Noop),

        (InProgress, Start) => Err(TransitionError::AlreadyInProgress),
        (InProgress, Complete) => Ok(Decision::Move {
            to: Done,
            effect: Effect::SetCompletedAt,
        }),
        (InProgress, MarkOverdue) => Ok(Decision::Move {
            to: Overdue,
            effect: Effect::None,
        }),
        (InProgress, Reopen) => Err(TransitionError::IllegalReopen(InProgress)),

        (Done, Start) => Err(TransitionError::CannotRestartCompleted),
        (Done, Complete) => Ok(Decision::Noop),
        (Done, MarkOverdue) => Err(TransitionError::CannotOverdueCompleted),
        (Done, Reopen) => Ok(Decision::Move {
            to: NotStarted,
            effect: Effect::ClearCompletedAt,
        }),

        (Overdue, Start) => Ok(Decision::Move {
            to: InProgress,
            effect: Effect::SetStartedAtIfUnset,
        }),
        (Overdue, Complete) => Ok(Decision::Move {
            to: Done,
            effect: Effect::SetCompletedAt,
        }),
        (Overdue, MarkOverdue) => Ok(Decision::StillOverdue),
        (Overdue, Reopen) => Err(TransitionError::IllegalReopen(Overdue)),
    }
}
