//! Report inclusion rules.

use crate::types::{ReportParameters, TaskSnapshot, TaskStatus};

/// Inclusive window test.
pub fn in_window(ts: i64, from: i64, to: i64) -> bool {
    ts >= from && ts <= to
}

/// Decide whether a task belongs in the report.
///
/// Rules run in order and later rules override earlier ones; in particular
/// the completed-before-window exclusion (step 4) runs after the tentative
/// window match (step 3), so a task finished before the window opened is
/// dropped even when some recorded event would otherwise pull it in.
pub fn selects(snapshot: &TaskSnapshot, params: &ReportParameters) -> bool {
    let task = &snapshot.task;

    // 1. Assignee scope.
    if let Some(ref assignee) = params.assignee_id {
        if task.assignee_id.as_deref() != Some(assignee.as_str()) {
            return false;
        }
    }

    // 2. Status allow-list (empty list means all statuses).
    if !params.statuses.is_empty() && !params.statuses.contains(&task.status) {
        return false;
    }

    // 3. Tentative inclusion: the task was created, touched, or completed
    // inside the window.
    let created_in = in_window(task.created_at, params.from, params.to);
    let touched_in = snapshot
        .history
        .iter()
        .any(|entry| in_window(entry.timestamp, params.from, params.to));
    let completed_in = task.status == TaskStatus::Done
        && task
            .completed_at
            .is_some_and(|c| in_window(c, params.from, params.to));

    if !(created_in || touched_in || completed_in) {
        return false;
    }

    // 4. Override: a task fully completed before the window opened is never
    // shown.
    if task.status == TaskStatus::Done {
        if let Some(completed) = task.completed_at {
            if completed < params.from {
                return false;
            }
        }
    }

    true
}
