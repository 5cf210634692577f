//! Report scoping and universe snapshots.

use super::history::task_history_internal;
use super::members::get_member_internal;
use super::projects::get_project_internal;
use super::tasks::parse_task_row;
use super::{now_ms, Database};
use crate::error::ReportError;
use crate::report;
use crate::types::{ReportAggregate, ReportParameters, TaskSnapshot};
use anyhow::Result;
use rusqlite::params;
use tracing::debug;

impl Database {
    /// Snapshot the task universe for a report: every task (optionally
    /// narrowed to a project) together with its ledger, read under one
    /// connection hold for consistency.
    pub fn load_universe(&self, project_id: Option<&str>) -> Result<Vec<TaskSnapshot>> {
        self.with_conn(|conn| {
            let (sql, filter) = match project_id {
                Some(pid) => (
                    "SELECT * FROM tasks WHERE project_id = ?1 ORDER BY created_at ASC",
                    Some(pid),
                ),
                None => ("SELECT * FROM tasks ORDER BY created_at ASC", None),
            };

            let mut stmt = conn.prepare(sql)?;
            let tasks = match filter {
                Some(pid) => stmt
                    .query_map(params![pid], parse_task_row)?
                    .collect::<Result<Vec<_>, _>>()?,
                None => stmt
                    .query_map([], parse_task_row)?
                    .collect::<Result<Vec<_>, _>>()?,
            };

            tasks
                .into_iter()
                .map(|task| {
                    let history = task_history_internal(conn, &task.id)?;
                    Ok(TaskSnapshot { task, history })
                })
                .collect()
        })
    }

    /// Generate a report: validate the scope ids, snapshot the universe, and
    /// run the pure report engine over it.
    pub fn generate_report(&self, params: &ReportParameters) -> Result<ReportAggregate> {
        self.with_conn(|conn| {
            if let Some(ref pid) = params.project_id {
                if get_project_internal(conn, pid)?.is_none() {
                    return Err(ReportError::UnknownProjectOrAssignee(pid.clone()).into());
                }
            }
            if let Some(ref aid) = params.assignee_id {
                if get_member_internal(conn, aid)?.is_none() {
                    return Err(ReportError::UnknownProjectOrAssignee(aid.clone()).into());
                }
            }
            Ok(())
        })?;

        let universe = self.load_universe(params.project_id.as_deref())?;
        let aggregate = report::generate(params, &universe, now_ms())?;

        debug!(
            report_id = %aggregate.id,
            total = aggregate.total,
            "Report generated"
        );

        Ok(aggregate)
    }
}
