//! To-do CRUD and cascade soft delete.

use super::{Database, now_ms, today};
use crate::types::{CreateTodo, Todo, TodoStatus, UpdateTodo};
use anyhow::{Result, anyhow};
use chrono::{NaiveDate, TimeZone};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

pub fn parse_todo_row(row: &Row) -> rusqlite::Result<Todo> {
    let id: String = row.get("id")?;
    let title: String = row.get("title")?;
    let status: String = row.get("status")?;
    let note: Option<String> = row.get("note")?;
    let created_at: i64 = row.get("created_at")?;
    let completed_at: Option<i64> = row.get("completed_at")?;
    let parent_id: Option<String> = row.get("parent_id")?;
    let position: i32 = row.get("position")?;
    let created_date: String = row.get("created_date")?;

    Ok(Todo {
        id,
        title,
        status: TodoStatus::from_str(&status).unwrap_or(TodoStatus::Pending),
        note,
        created_at,
        completed_at,
        parent_id,
        position,
        created_date,
    })
}

/// Internal helper to get a todo using an existing connection.
/// Returns tombstones too; callers filter deleted rows where required.
fn get_todo_internal(conn: &Connection, id: &str) -> Result<Option<Todo>> {
    let mut stmt = conn.prepare("SELECT * FROM todos WHERE id = ?1")?;

    let result = stmt.query_row(params![id], parse_todo_row);

    match result {
        Ok(todo) => Ok(Some(todo)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Epoch milliseconds of local noon on the given `YYYY-MM-DD` date.
///
/// Used when a todo is moved to another day: the creation timestamp is
/// re-anchored to the middle of that day so timestamp ordering stays
/// consistent with the calendar date.
fn local_noon_ms(date: &str) -> Result<i64> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| anyhow!("invalid date {}: {}", date, e))?;
    let noon = day
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| anyhow!("invalid time for date {}", date))?;
    let anchored = chrono::Local
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| anyhow!("unrepresentable local time for date {}", date))?;
    Ok(anchored.timestamp_millis())
}

impl Database {
    /// List non-deleted top-level todos, optionally restricted to one status.
    /// Ordered by created_date descending, then position, then created_at.
    pub fn list_top_level(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>> {
        self.with_conn(|conn| {
            let base = "SELECT * FROM todos
                 WHERE status != 'deleted' AND parent_id IS NULL";
            let order = " ORDER BY created_date DESC, position ASC, created_at ASC";

            let todos = match status {
                Some(status) => {
                    let sql = format!("{} AND status = ?1{}", base, order);
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map(params![status.as_str()], parse_todo_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let sql = format!("{}{}", base, order);
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([], parse_todo_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(todos)
        })
    }

    /// List non-deleted children of a parent, ordered by position.
    pub fn list_children(&self, parent_id: &str) -> Result<Vec<Todo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM todos
                 WHERE parent_id = ?1 AND status != 'deleted'
                 ORDER BY position ASC, created_at ASC",
            )?;
            let rows = stmt.query_map(params![parent_id], parse_todo_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Get a todo by id, tombstones included. Internal read path only;
    /// the API never exposes deleted rows.
    pub fn get_todo(&self, id: &str) -> Result<Option<Todo>> {
        self.with_conn(|conn| get_todo_internal(conn, id))
    }

    /// Create a new pending todo. `created_date` defaults to the server's
    /// local date.
    pub fn create_todo(&self, input: CreateTodo) -> Result<Todo> {
        let id = Uuid::new_v4().to_string();
        let now = now_ms();
        let created_date = input.created_date.unwrap_or_else(today);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO todos (id, title, status, note, created_at, completed_at,
                                    parent_id, position, created_date)
                 VALUES (?1, ?2, 'pending', NULL, ?3, NULL, ?4, 0, ?5)",
                params![id, input.title, now, input.parent_id, created_date],
            )?;
            get_todo_internal(conn, &id)?
                .ok_or_else(|| anyhow!("todo {} missing after insert", id))
        })
    }

    /// Partially update a todo. Setting status to done stamps completed_at;
    /// any other status clears it. Moving the todo to another created_date
    /// also re-anchors created_at to local noon of that date.
    ///
    /// Returns `None` when the id is unknown.
    pub fn update_todo(&self, id: &str, patch: UpdateTodo) -> Result<Option<Todo>> {
        self.with_conn(|conn| {
            let Some(mut todo) = get_todo_internal(conn, id)? else {
                return Ok(None);
            };

            if let Some(title) = patch.title {
                todo.title = title;
            }
            if let Some(note) = patch.note {
                todo.note = Some(note);
            }
            if let Some(created_date) = patch.created_date {
                todo.created_at = local_noon_ms(&created_date)?;
                todo.created_date = created_date;
            }
            if let Some(status) = patch.status {
                todo.status = status;
                todo.completed_at = if status == TodoStatus::Done {
                    Some(now_ms())
                } else {
                    None
                };
            }

            conn.execute(
                "UPDATE todos
                 SET title = ?2, status = ?3, note = ?4, created_at = ?5,
                     completed_at = ?6, created_date = ?7
                 WHERE id = ?1",
                params![
                    id,
                    todo.title,
                    todo.status.as_str(),
                    todo.note,
                    todo.created_at,
                    todo.completed_at,
                    todo.created_date,
                ],
            )?;

            Ok(Some(todo))
        })
    }

    /// Soft-delete a todo and all of its children in one transaction.
    ///
    /// Returns the deleted target, or `None` when the id is unknown.
    pub fn soft_delete_todo(&self, id: &str) -> Result<Option<Todo>> {
        self.with_conn_mut(|conn| {
            if get_todo_internal(conn, id)?.is_none() {
                return Ok(None);
            }

            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE todos SET status = 'deleted' WHERE parent_id = ?1",
                params![id],
            )?;
            tx.execute(
                "UPDATE todos SET status = 'deleted' WHERE id = ?1",
                params![id],
            )?;
            tx.commit()?;

            get_todo_internal(conn, id)
        })
    }
}
