//! Report calculators.
//!
//! Four independent total functions over the filtered task set, each writing
//! a disjoint group of aggregate fields. Order does not matter; `generate`
//! folds them over the aggregate.

use crate::types::{ReportAggregate, TaskSnapshot, TaskStatus};

pub type Calculator = fn(&[TaskSnapshot], i64, &mut ReportAggregate);

pub const CALCULATORS: &[Calculator] =
    &[progress, status_counts, elapsed, deadline_compliance];

/// Total task count and percentage done.
pub fn progress(selected: &[TaskSnapshot], _now: i64, agg: &mut ReportAggregate) {
    let total = selected.len() as i64;
    let done = selected
        .iter()
        .filter(|s| s.task.status == TaskStatus::Done)
        .count() as i64;

    agg.total = total;
    agg.percent_done = if total == 0 {
        0.0
    } else {
        100.0 * done as f64 / total as f64
    };
}

/// Per-status counts; every status key is present even when zero.
pub fn status_counts(selected: &[TaskSnapshot], _now: i64, agg: &mut ReportAggregate) {
    for status in TaskStatus::ALL {
        agg.counts_by_status.insert(status, 0);
    }
    for snapshot in selected {
        *agg.counts_by_status.entry(snapshot.task.status).or_insert(0) += 1;
    }
}

/// Duration contributed by one task, if any.
///
/// In-progress and overdue tasks contribute a still-running estimate from
/// `started_at` to now; done tasks contribute their start-to-completion
/// span. Non-positive durations are discarded (clock skew, bad imports).
fn task_elapsed(snapshot: &TaskSnapshot, now: i64) -> Option<i64> {
    let task = &snapshot.task;
    let duration = match task.status {
        TaskStatus::InProgress | TaskStatus::Overdue => now - task.started_at?,
        TaskStatus::Done => task.completed_at? - task.started_at?,
        TaskStatus::NotStarted => return None,
    };
    (duration > 0).then_some(duration)
}

/// Total and mean elapsed time over the tasks that contribute a duration.
pub fn elapsed(selected: &[TaskSnapshot], now: i64, agg: &mut ReportAggregate) {
    let durations: Vec<i64> = selected
        .iter()
        .filter_map(|s| task_elapsed(s, now))
        .collect();

    agg.total_elapsed_ms = durations.iter().sum();
    agg.average_elapsed_ms = if durations.is_empty() {
        0
    } else {
        agg.total_elapsed_ms / durations.len() as i64
    };
}

/// Deadline compliance counters.
///
/// `done_on_time` needs status done plus both stamps with completion at or
/// before the deadline. `overdue_count` covers late completions and tasks
/// currently overdue. A done task without a deadline counts toward neither.
pub fn deadline_compliance(selected: &[TaskSnapshot], _now: i64, agg: &mut ReportAggregate) {
    let mut on_time = 0;
    let mut overdue = 0;

    for snapshot in selected {
        let task = &snapshot.task;
        match task.status {
            TaskStatus::Done => {
                if let (Some(completed), Some(deadline)) = (task.completed_at, task.deadline) {
                    if completed <= deadline {
                        on_time += 1;
                    } else {
                        overdue += 1;
                    }
                }
            }
            TaskStatus::Overdue => overdue += 1,
            _ => {}
        }
    }

    agg.done_on_time = on_time;
    agg.overdue_count = overdue;
}
