//! Storage seam between the API layer and the relational store.

use crate::db::Database;
use crate::types::{CreateTodo, Todo, TodoStatus, UpdateTodo};
use anyhow::Result;

/// Abstract task storage. `Database` is the one relational implementation;
/// tests can substitute any other.
pub trait TodoStore: Send + Sync {
    /// Non-deleted top-level todos, optionally restricted to one status,
    /// ordered by created_date descending, then position, then created_at.
    fn list_top_level(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>>;

    /// Non-deleted children of a parent, ordered by position.
    fn list_children(&self, parent_id: &str) -> Result<Vec<Todo>>;

    /// Direct id lookup, tombstones included. Never exposed through the API.
    fn get_todo(&self, id: &str) -> Result<Option<Todo>>;

    fn create_todo(&self, input: CreateTodo) -> Result<Todo>;

    /// Partial update. `None` when the id is unknown.
    fn update_todo(&self, id: &str, patch: UpdateTodo) -> Result<Option<Todo>>;

    /// Cascade soft delete (children then target). `None` when the id is
    /// unknown.
    fn soft_delete_todo(&self, id: &str) -> Result<Option<Todo>>;

    fn get_setting(&self, key: &str) -> Result<Option<String>>;

    fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}

impl TodoStore for Database {
    fn list_top_level(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>> {
        Database::list_top_level(self, status)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Todo>> {
        Database::list_children(self, parent_id)
    }

    fn get_todo(&self, id: &str) -> Result<Option<Todo>> {
        Database::get_todo(self, id)
    }

    fn create_todo(&self, input: CreateTodo) -> Result<Todo> {
        Database::create_todo(self, input)
    }

    fn update_todo(&self, id: &str, patch: UpdateTodo) -> Result<Option<Todo>> {
        Database::update_todo(self, id, patch)
    }

    fn soft_delete_todo(&self, id: &str) -> Result<Option<Todo>> {
        Database::soft_delete_todo(self, id)
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Database::get_setting(self, key)
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        Database::put_setting(self, key, value)
    }
}
