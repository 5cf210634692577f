//! Task CRUD, lifecycle transitions, and the overdue sweep.

use super::history::{record_transition, task_history_internal};
use super::members::get_member_internal;
use super::{now_ms, Database};
use crate::assignment::{self, Verdict};
use crate::error::{InvariantViolation, TransitionError};
use crate::lifecycle::{self, Decision, Effect, Operation};
use crate::types::{Task, TaskSnapshot, TaskStatus, SYSTEM_ACTOR};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Convert a stored status string back to the closed enum.
pub(crate) fn parse_status(s: &str) -> rusqlite::Result<TaskStatus> {
    TaskStatus::from_str(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown task status '{s}'").into(),
        )
    })
}

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let required_skills_json: Option<String> = row.get("required_skills")?;

    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        assignee_id: row.get("assignee_id")?,
        status: parse_status(&status)?,
        required_skills: required_skills_json
            .map(|s| serde_json::from_str(&s).unwrap_or_default())
            .unwrap_or_default(),
        deadline: row.get("deadline")?,
        created_at: row.get("created_at")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Internal helper to count a member's in-progress tasks.
pub(crate) fn active_task_count_internal(conn: &Connection, member_id: &str) -> Result<i32> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE assignee_id = ?1 AND status = 'in_progress'",
        params![member_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

impl Database {
    /// Create a new task in `NotStarted` status.
    ///
    /// The title must be non-empty; referenced project and assignee must
    /// exist. The task id is a generated UUIDv7.
    pub fn create_task(
        &self,
        project_id: Option<String>,
        title: String,
        description: Option<String>,
        assignee_id: Option<String>,
        required_skills: Vec<String>,
        deadline: Option<i64>,
    ) -> Result<Task> {
        if title.trim().is_empty() {
            return Err(InvariantViolation::EmptyTitle.into());
        }

        let task_id = Uuid::now_v7().to_string();
        let now = now_ms();
        let skills_json = serde_json::to_string(&required_skills)?;

        self.with_conn(|conn| {
            if let Some(ref pid) = project_id {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)",
                    params![pid],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(anyhow!("project not found: {}", pid));
                }
            }
            if let Some(ref aid) = assignee_id {
                if get_member_internal(conn, aid)?.is_none() {
                    return Err(anyhow!("member not found: {}", aid));
                }
            }

            conn.execute(
                "INSERT INTO tasks (
                    id, project_id, title, description, assignee_id, status,
                    required_skills, deadline, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    &task_id,
                    project_id,
                    &title,
                    description,
                    assignee_id,
                    TaskStatus::NotStarted.as_str(),
                    skills_json,
                    deadline,
                    now,
                    now,
                ],
            )?;

            debug!(task_id = %task_id, "Task created");

            Ok(Task {
                id: task_id.clone(),
                project_id,
                title,
                description,
                assignee_id,
                status: TaskStatus::NotStarted,
                required_skills,
                deadline,
                created_at: now,
                started_at: None,
                completed_at: None,
                updated_at: now,
            })
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks, optionally scoped to a project, newest first.
    pub fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let (sql, filter) = match project_id {
                Some(pid) => (
                    "SELECT * FROM tasks WHERE project_id = ?1 ORDER BY created_at DESC",
                    Some(pid),
                ),
                None => ("SELECT * FROM tasks ORDER BY created_at DESC", None),
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

            Ok(tasks)
        })
    }

    /// Assign a task to a member after running the assignment rules.
    ///
    /// Returns the updated task plus any rule warnings. A rule failure
    /// rejects the assignment and leaves the task untouched.
    pub fn assign_task(&self, task_id: &str, member_id: &str) -> Result<(Task, Vec<String>)> {
        let now = now_ms();

        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?
                .ok_or_else(|| TransitionError::TaskNotFound(task_id.to_string()))?;
            let member = get_member_internal(conn, member_id)?
                .ok_or_else(|| anyhow!("member not found: {}", member_id))?;

            let workload = active_task_count_internal(conn, member_id)?;

            let warnings = match assignment::evaluate(&task, &member, workload) {
                Verdict::Rejected(reason) => {
                    return Err(anyhow!("assignment rejected: {}", reason));
                }
                Verdict::Accepted { warnings } => warnings,
            };

            conn.execute(
                "UPDATE tasks SET assignee_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![member_id, now, task_id],
            )?;

            debug!(task_id = %task_id, member_id = %member_id, "Task assigned");

            Ok((
                Task {
                    assignee_id: Some(member_id.to_string()),
                    updated_at: now,
                    ..task
                },
                warnings,
            ))
        })
    }

    /// Apply a lifecycle operation to a task on behalf of an actor.
    ///
    /// Legality comes from [`lifecycle::decide`]; an applied change writes
    /// the new status and appends the ledger entry in one transaction, so a
    /// failure can never leave the two out of step. No-op outcomes succeed
    /// without touching the row.
    pub fn transition(&self, task_id: &str, op: Operation, actor_id: &str) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| TransitionError::TaskNotFound(task_id.to_string()))?;

            let decision = lifecycle::decide(task.status, op)?;

            let task = match decision {
                Decision::Noop => task,
                Decision::StillOverdue => {
                    record_transition(
                        &tx,
                        task_id,
                        TaskStatus::Overdue,
                        TaskStatus::Overdue,
                        actor_id,
                        now,
                    )?;
                    task
                }
                Decision::Move { to, effect } => {
                    let (_, ts) =
                        record_transition(&tx, task_id, task.status, to, actor_id, now)?;

                    let (started_at, completed_at) = match effect {
                        Effect::SetStartedAt => (Some(ts), task.completed_at),
                        Effect::SetStartedAtIfUnset => {
                            (task.started_at.or(Some(ts)), task.completed_at)
                        }
                        Effect::SetCompletedAt => (task.started_at, Some(ts)),
                        Effect::ClearCompletedAt => (task.started_at, None),
                        Effect::None => (task.started_at, task.completed_at),
                    };

                    tx.execute(
                        "UPDATE tasks
                         SET status = ?1, started_at = ?2, completed_at = ?3, updated_at = ?4
                         WHERE id = ?5",
                        params![to.as_str(), started_at, completed_at, ts, task_id],
                    )?;

                    debug!(
                        task_id = %task_id,
                        from = %task.status,
                        to = %to,
                        actor = %actor_id,
                        "Task transitioned"
                    );

                    Task {
                        status: to,
                        started_at,
                        completed_at,
                        updated_at: ts,
                        ..task
                    }
                }
            };

            tx.commit()?;
            Ok(task)
        })
    }

    /// Load a task together with its ledger.
    pub fn task_snapshot(&self, task_id: &str) -> Result<Option<TaskSnapshot>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };
            let history = task_history_internal(conn, &task.id)?;
            Ok(Some(TaskSnapshot { task, history }))
        })
    }

    /// Mark every task whose deadline has passed as overdue, attributed to
    /// the `system` actor.
    ///
    /// Already-overdue tasks are re-marked on purpose: each sweep appends an
    /// `overdue -> overdue` ledger entry, so the ledger records every time
    /// the task was observed still overdue. Completed tasks are skipped.
    /// Returns the ids of the tasks swept.
    pub fn sweep_overdue(&self, now: i64) -> Result<Vec<String>> {
        let due: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM tasks
                 WHERE deadline IS NOT NULL AND deadline < ?1
                   AND status IN ('not_started', 'in_progress', 'overdue')
                 ORDER BY deadline ASC",
            )?;
            let ids = stmt
                .query_map(params![now], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })?;

        for task_id in &due {
            self.transition(task_id, Operation::MarkOverdue, SYSTEM_ACTOR)?;
        }

        if !due.is_empty() {
            info!(count = due.len(), "Overdue sweep marked tasks");
        }

        Ok(due)
    }
}
