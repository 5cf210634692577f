//! The append-only transition ledger.
//!
//! One ledger per task, embedded in the task's row set: entries are only ever
//! inserted, never updated or deleted (dropping a task cascades). The ledger
//! is written in the same transaction as the status column, so a task's
//! status is always the `to_status` of its newest entry.

use super::tasks::parse_status;
use super::Database;
use crate::types::{TaskStatus, TransitionRecord};
use anyhow::Result;
use rusqlite::{params, Connection, Row};

pub(crate) fn parse_history_row(row: &Row) -> rusqlite::Result<TransitionRecord> {
    let from: String = row.get("from_status")?;
    let to: String = row.get("to_status")?;

    Ok(TransitionRecord {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        from_status: parse_status(&from)?,
        to_status: parse_status(&to)?,
        actor_id: row.get("actor_id")?,
        timestamp: row.get("timestamp")?,
    })
}

/// Append one ledger entry for a task.
///
/// The timestamp is clamped against the newest existing entry so timestamps
/// stay non-decreasing per task even if the wall clock steps backwards.
/// Returns the rowid and the timestamp actually recorded.
pub(crate) fn record_transition(
    conn: &Connection,
    task_id: &str,
    from: TaskStatus,
    to: TaskStatus,
    actor_id: &str,
    now: i64,
) -> Result<(i64, i64)> {
    let last: Option<i64> = conn
        .query_row(
            "SELECT timestamp FROM task_history
             WHERE task_id = ?1 ORDER BY id DESC LIMIT 1",
            params![task_id],
            |row| row.get(0),
        )
        .ok();

    let timestamp = last.map_or(now, |t| now.max(t));

    conn.execute(
        "INSERT INTO task_history (task_id, from_status, to_status, actor_id, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![task_id, from.as_str(), to.as_str(), actor_id, timestamp],
    )?;

    Ok((conn.last_insert_rowid(), timestamp))
}

/// Internal helper to read a task's ledger using an existing connection.
pub(crate) fn task_history_internal(
    conn: &Connection,
    task_id: &str,
) -> Result<Vec<TransitionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, task_id, from_status, to_status, actor_id, timestamp
         FROM task_history
         WHERE task_id = ?1
         ORDER BY id ASC",
    )?;

    let entries = stmt
        .query_map(params![task_id], parse_history_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

impl Database {
    /// Get the transition ledger for a task, oldest first.
    pub fn task_history(&self, task_id: &str) -> Result<Vec<TransitionRecord>> {
        self.with_conn(|conn| task_history_internal(conn, task_id))
    }
}
