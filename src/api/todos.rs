//! Task endpoints: list (day-grouped), create, update, soft delete,
//! add child.

use super::{AppState, parse_body};
use crate::error::{ApiError, ApiResult};
use crate::types::{CreateTodo, Todo, TodoStatus, TodoWithChildren, UpdateTodo};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
}

/// Bucket top-level todos by created_date, keeping repository order within
/// each bucket except that cancelled todos stably sort to the end.
fn group_by_date(todos: Vec<TodoWithChildren>) -> BTreeMap<String, Vec<TodoWithChildren>> {
    let mut groups: BTreeMap<String, Vec<TodoWithChildren>> = BTreeMap::new();
    for todo in todos {
        groups
            .entry(todo.todo.created_date.clone())
            .or_default()
            .push(todo);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|t| t.todo.status == TodoStatus::Cancelled);
    }
    groups
}

/// GET /api/todos — top-level todos with children, grouped by day.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = match params.status.as_deref() {
        Some(s) => Some(
            TodoStatus::from_str(s)
                .ok_or_else(|| ApiError::invalid_value("status", "unknown status"))?,
        ),
        None => None,
    };

    let top_level = state.store().list_top_level(status)?;
    let mut annotated = Vec::with_capacity(top_level.len());
    for todo in top_level {
        let children = state.store().list_children(&todo.id)?;
        annotated.push(TodoWithChildren { todo, children });
    }

    Ok(Json(json!({ "groups": group_by_date(annotated) })))
}

/// Extract a required, trimmed, non-empty title from a request body.
fn required_title(body: &Value) -> ApiResult<String> {
    body.get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::Validation("Title is required".into()))
}

/// POST /api/todos — create a top-level todo.
pub async fn create(State(state): State<AppState>, bytes: Bytes) -> ApiResult<impl IntoResponse> {
    let body = parse_body(&bytes)?;
    let title = required_title(&body)?;

    let todo = state.store().create_todo(CreateTodo {
        title,
        ..Default::default()
    })?;

    Ok((StatusCode::CREATED, Json(todo)))
}

fn parse_patch(body: &Value) -> ApiResult<UpdateTodo> {
    let mut patch = UpdateTodo::default();

    if body.get("title").is_some() {
        patch.title = Some(required_title(body)?);
    }
    if let Some(status) = body.get("status") {
        let status = status
            .as_str()
            .and_then(TodoStatus::from_str)
            .filter(|s| *s != TodoStatus::Deleted)
            .ok_or_else(|| {
                ApiError::invalid_value("status", "expected pending, done or cancelled")
            })?;
        patch.status = Some(status);
    }
    if let Some(note) = body.get("note") {
        let note = note
            .as_str()
            .ok_or_else(|| ApiError::invalid_value("note", "expected a string"))?;
        patch.note = Some(note.to_string());
    }
    if let Some(date) = body.get("createdDate") {
        let date = date
            .as_str()
            .filter(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
            .ok_or_else(|| ApiError::invalid_value("createdDate", "expected YYYY-MM-DD"))?;
        patch.created_date = Some(date.to_string());
    }

    Ok(patch)
}

/// PATCH /api/todos/{id} — partial update.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> ApiResult<Json<Todo>> {
    let body = parse_body(&bytes)?;
    let patch = parse_patch(&body)?;

    let todo = state
        .store()
        .update_todo(&id, patch)?
        .ok_or_else(ApiError::todo_not_found)?;

    Ok(Json(todo))
}

/// DELETE /api/todos/{id} — soft delete, cascading to children.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Todo>> {
    let todo = state
        .store()
        .soft_delete_todo(&id)?
        .ok_or_else(ApiError::todo_not_found)?;

    Ok(Json(todo))
}

/// POST /api/todos/{id}/children — create a sub-task under an existing,
/// non-deleted parent.
pub async fn add_child(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
    bytes: Bytes,
) -> ApiResult<impl IntoResponse> {
    let body = parse_body(&bytes)?;
    let title = required_title(&body)?;

    let parent = state
        .store()
        .get_todo(&parent_id)?
        .filter(|p| p.status != TodoStatus::Deleted)
        .ok_or_else(ApiError::parent_not_found)?;

    let child = state.store().create_todo(CreateTodo {
        title,
        parent_id: Some(parent.id),
        ..Default::default()
    })?;

    Ok((StatusCode::CREATED, Json(child)))
}
