//! Core types for the daylist server.

use serde::{Deserialize, Serialize};

/// Task status. `Deleted` is a tombstone and never appears on a read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Done,
    Cancelled,
    Deleted,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::Done => "done",
            TodoStatus::Cancelled => "cancelled",
            TodoStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TodoStatus::Pending),
            "done" => Some(TodoStatus::Done),
            "cancelled" => Some(TodoStatus::Cancelled),
            "deleted" => Some(TodoStatus::Deleted),
            _ => None,
        }
    }
}

/// A to-do item.
///
/// Field names follow the REST wire contract (camelCase). Timestamps are
/// epoch milliseconds; `created_date` is the user's calendar date
/// (`YYYY-MM-DD`), stored independently of the timestamp so day grouping
/// does not shift with server timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub status: TodoStatus,
    pub note: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub parent_id: Option<String>,
    /// Ordering hint among siblings. Reserved; always written as 0.
    pub position: i32,
    pub created_date: String,
}

/// A top-level to-do with its children, for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoWithChildren {
    #[serde(flatten)]
    pub todo: Todo,
    pub children: Vec<Todo>,
}

/// Input for creating a to-do. Title is expected to be trimmed non-empty
/// by the caller.
#[derive(Debug, Clone, Default)]
pub struct CreateTodo {
    pub title: String,
    pub parent_id: Option<String>,
    /// Defaults to the server's local date when omitted.
    pub created_date: Option<String>,
}

/// Partial update for a to-do. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub status: Option<TodoStatus>,
    pub note: Option<String>,
    pub created_date: Option<String>,
}
