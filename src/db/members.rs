//! Member CRUD and workload queries.

use super::tasks::active_task_count_internal;
use super::{now_ms, Database};
use crate::error::InvariantViolation;
use crate::types::{Member, DEFAULT_CAPACITY};
use anyhow::Result;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

fn parse_member_row(row: &Row) -> rusqlite::Result<Member> {
    let skills_json: String = row.get("skills")?;

    Ok(Member {
        id: row.get("id")?,
        name: row.get("name")?,
        skills: serde_json::from_str(&skills_json).unwrap_or_default(),
        capacity: row.get("capacity")?,
        created_at: row.get("created_at")?,
    })
}

/// Internal helper to get a member using an existing connection (avoids deadlock).
pub(crate) fn get_member_internal(conn: &Connection, member_id: &str) -> Result<Option<Member>> {
    let mut stmt =
        conn.prepare("SELECT id, name, skills, capacity, created_at FROM members WHERE id = ?1")?;

    let result = stmt.query_row(params![member_id], parse_member_row);

    match result {
        Ok(member) => Ok(Some(member)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a member. The name must be non-empty; capacity defaults to
    /// [`DEFAULT_CAPACITY`] when not given.
    pub fn create_member(
        &self,
        name: String,
        skills: Vec<String>,
        capacity: Option<i32>,
    ) -> Result<Member> {
        if name.trim().is_empty() {
            return Err(InvariantViolation::EmptyName.into());
        }

        let member_id = Uuid::now_v7().to_string();
        let now = now_ms();
        let capacity = capacity.unwrap_or(DEFAULT_CAPACITY);
        let skills_json = serde_json::to_string(&skills)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO members (id, name, skills, capacity, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![&member_id, &name, skills_json, capacity, now],
            )?;

            Ok(Member {
                id: member_id.clone(),
                name,
                skills,
                capacity,
                created_at: now,
            })
        })
    }

    /// Get a member by id.
    pub fn get_member(&self, member_id: &str) -> Result<Option<Member>> {
        self.with_conn(|conn| get_member_internal(conn, member_id))
    }

    /// List all members, oldest first.
    pub fn list_members(&self) -> Result<Vec<Member>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, skills, capacity, created_at FROM members ORDER BY created_at ASC",
            )?;
            let members = stmt
                .query_map([], parse_member_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(members)
        })
    }

    /// Number of tasks currently in progress for a member.
    pub fn active_task_count(&self, member_id: &str) -> Result<i32> {
        self.with_conn(|conn| active_task_count_internal(conn, member_id))
    }
}
