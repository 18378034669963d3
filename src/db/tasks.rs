//! Task CRUD on the `tasks` table.

use super::{Database, now_ms};
use crate::backend::{BackendError, ParentFilter};
use crate::types::{NewTask, Task, TaskPatch};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, urgent, important, completed, notes, parent_id, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        urgent: row.get("urgent")?,
        important: row.get("important")?,
        completed: row.get("completed")?,
        notes: row.get("notes")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Insert a new task. Generates a UUID7 id and stamps `created_at`.
    ///
    /// Fails with [`BackendError::NotFound`] when `parent_id` names no row.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: input.title,
            urgent: input.urgent,
            important: input.important,
            completed: input.completed,
            notes: input.notes,
            parent_id: input.parent_id,
            created_at: now_ms(),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(parent_id) = &task.parent_id {
                if get_task_internal(&tx, parent_id)?.is_none() {
                    return Err(BackendError::NotFound(parent_id.clone()).into());
                }
            }

            tx.execute(
                &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    &task.id,
                    &task.title,
                    task.urgent,
                    task.important,
                    task.completed,
                    &task.notes,
                    &task.parent_id,
                    task.created_at,
                ],
            )?;

            tx.commit()?;
            Ok(())
        })?;

        Ok(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks for a parent filter, oldest first.
    pub fn list_tasks(&self, filter: &ParentFilter) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let (clause, param): (&str, Option<&str>) = match filter {
                ParentFilter::Any => ("", None),
                ParentFilter::Root => (" WHERE parent_id IS NULL", None),
                ParentFilter::Parent(id) => (" WHERE parent_id = ?1", Some(id.as_str())),
            };
            let sql =
                format!("SELECT {TASK_COLUMNS} FROM tasks{clause} ORDER BY created_at ASC, rowid ASC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = match param {
                Some(p) => stmt.query_map(params![p], parse_task_row)?,
                None => stmt.query_map([], parse_task_row)?,
            };
            let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Direct child ids of a task.
    pub fn child_ids(&self, parent_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM tasks WHERE parent_id = ?1 ORDER BY created_at ASC, rowid ASC",
            )?;
            let ids = stmt
                .query_map(params![parent_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
    }

    /// Apply a partial update. Fails with [`BackendError::NotFound`] for unknown ids.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| BackendError::NotFound(task_id.to_string()))?;
            task.apply(patch);

            tx.execute(
                "UPDATE tasks SET
                    title = ?1, urgent = ?2, important = ?3, completed = ?4, notes = ?5
                WHERE id = ?6",
                params![
                    &task.title,
                    task.urgent,
                    task.important,
                    task.completed,
                    &task.notes,
                    task_id,
                ],
            )?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a single row. Children are not touched.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(deleted > 0)
        })
    }

    /// Count tasks whose parent_id points at a missing row.
    pub fn count_dangling(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM tasks t
                 WHERE t.parent_id IS NOT NULL
                   AND NOT EXISTS (SELECT 1 FROM tasks p WHERE p.id = t.parent_id)",
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
