//! Project CRUD.

use super::{now_ms, Database};
use crate::error::InvariantViolation;
use crate::types::Project;
use anyhow::Result;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn get_project_internal(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, created_at FROM projects WHERE id = ?1")?;

    let result = stmt.query_row(params![project_id], parse_project_row);

    match result {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a project. The name must be non-empty.
    pub fn create_project(&self, name: String, description: Option<String>) -> Result<Project> {
        if name.trim().is_empty() {
            return Err(InvariantViolation::EmptyName.into());
        }

        let project_id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![&project_id, &name, description, now],
            )?;

            Ok(Project {
                id: project_id.clone(),
                name,
                description,
                created_at: now,
            })
        })
    }

    /// Get a project by id.
    pub fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        self.with_conn(|conn| get_project_internal(conn, project_id))
    }

    /// List all projects, oldest first.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at FROM projects ORDER BY created_at ASC",
            )?;
            let projects = stmt
                .query_map([], parse_project_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(projects)
        })
    }
}
