//! Core types for the task ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Actor id recorded for automated transitions (e.g. the overdue sweep)
/// rather than user-initiated ones.
pub const SYSTEM_ACTOR: &str = "system";

/// Lifecycle status of a task.
///
/// The four statuses are closed: the transition table in `lifecycle` is an
/// exhaustive match over them, and the current status is always equal to the
/// `to_status` of the newest ledger entry (or `NotStarted` with no ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
    Overdue,
}

impl TaskStatus {
    /// All statuses, in ledger/report display order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Overdue,
    ];

    /// Stable string form used in the database and in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Overdue => "overdue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(TaskStatus::NotStarted),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "overdue" => Some(TaskStatus::Overdue),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work tracked through the lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    pub status: TaskStatus,

    /// Skills the assignee must cover (checked by the assignment rules).
    pub required_skills: Vec<String>,

    /// Epoch milliseconds. `created_at` is immutable; `started_at` and
    /// `completed_at` are stamped by the state machine (`completed_at` is
    /// cleared only by an explicit reopen).
    pub deadline: Option<i64>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub updated_at: i64,
}

/// One entry of a task's append-only transition ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub task_id: String,
    pub from_status: TaskStatus,
    pub to_status: TaskStatus,
    pub actor_id: String,
    /// Epoch ms; non-decreasing across consecutive entries of the same task.
    pub timestamp: i64,
}

/// A task together with its ledger, as handed to the report engine.
///
/// The report owns this read-only copy; generating a report never touches the
/// stored task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task: Task,
    pub history: Vec<TransitionRecord>,
}

/// A project grouping tasks for report scoping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

/// A member tasks can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub skills: Vec<String>,
    /// Maximum number of concurrently in-progress tasks.
    pub capacity: i32,
    pub created_at: i64,
}

/// Default member capacity when none is given.
pub const DEFAULT_CAPACITY: i32 = 5;

/// Parameters of a report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    /// Inclusive window, epoch ms.
    pub from: i64,
    pub to: i64,
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    /// Allow-list of statuses; empty means all.
    #[serde(default)]
    pub statuses: Vec<TaskStatus>,
    /// Opaque format name handed to the formatter layer; the report engine
    /// does not interpret it.
    pub output_format: String,
}

/// The computed statistical summary for a filtered set of tasks.
///
/// Immutable once built; formatters consume it as-is. `counts_by_status`
/// always carries all four statuses and its values sum to `total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAggregate {
    pub id: String,
    /// RFC 3339 generation timestamp.
    pub generated_at: String,
    pub parameters: ReportParameters,
    pub tasks: Vec<Task>,
    pub counts_by_status: BTreeMap<TaskStatus, i64>,
    pub total: i64,
    pub percent_done: f64,
    pub done_on_time: i64,
    pub overdue_count: i64,
    pub total_elapsed_ms: i64,
    pub average_elapsed_ms: i64,
}
