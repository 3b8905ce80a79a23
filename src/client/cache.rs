//! Optimistic reconciliation over the day-grouped todo view.
//!
//! Mutations are applied to the local view immediately under a transient
//! `tmp-` id, then either confirmed with the authoritative server response
//! or rolled back to the prior snapshot when the call fails. This is
//! advisory UI state only; server correctness never depends on it.

use crate::types::{Todo, TodoStatus, TodoWithChildren};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

enum PendingOp {
    /// Provisional entry inserted under the transient id itself.
    Create { date: String },
    /// Snapshot of the todo before an in-place edit.
    Update { prior: Todo },
    /// Entry removed from its group, kept for reinsertion on rollback.
    Delete {
        date: String,
        index: usize,
        removed: TodoWithChildren,
    },
}

/// Local day-grouped view with pending optimistic mutations.
pub struct OptimisticCache {
    groups: BTreeMap<String, Vec<TodoWithChildren>>,
    pending: HashMap<String, PendingOp>,
}

fn transient_id() -> String {
    format!("tmp-{}", Uuid::new_v4())
}

impl OptimisticCache {
    pub fn new() -> Self {
        Self::from_groups(BTreeMap::new())
    }

    /// Seed the cache from an authoritative list response.
    pub fn from_groups(groups: BTreeMap<String, Vec<TodoWithChildren>>) -> Self {
        Self {
            groups,
            pending: HashMap::new(),
        }
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<TodoWithChildren>> {
        &self.groups
    }

    /// Number of mutations awaiting confirmation or rollback.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut TodoWithChildren> {
        self.groups
            .values_mut()
            .flat_map(|group| group.iter_mut())
            .find(|entry| entry.todo.id == id)
    }

    fn remove_entry(&mut self, id: &str) -> Option<(String, usize, TodoWithChildren)> {
        let (date, index) = self.groups.iter().find_map(|(date, group)| {
            group
                .iter()
                .position(|entry| entry.todo.id == id)
                .map(|index| (date.clone(), index))
        })?;
        let group = self.groups.get_mut(&date)?;
        let removed = group.remove(index);
        if group.is_empty() {
            self.groups.remove(&date);
        }
        Some((date, index, removed))
    }

    fn insert_at(&mut self, date: &str, index: usize, entry: TodoWithChildren) {
        let group = self.groups.entry(date.to_string()).or_default();
        group.insert(index.min(group.len()), entry);
    }

    /// Insert a provisional pending todo into the given day's group.
    /// Returns the transient id used to confirm or roll back.
    pub fn apply_create(&mut self, title: &str, date: &str) -> String {
        let tmp_id = transient_id();
        let provisional = TodoWithChildren {
            todo: Todo {
                id: tmp_id.clone(),
                title: title.to_string(),
                status: TodoStatus::Pending,
                note: None,
                created_at: chrono::Utc::now().timestamp_millis(),
                completed_at: None,
                parent_id: None,
                position: 0,
                created_date: date.to_string(),
            },
            children: vec![],
        };
        self.groups
            .entry(date.to_string())
            .or_default()
            .push(provisional);
        self.pending.insert(
            tmp_id.clone(),
            PendingOp::Create {
                date: date.to_string(),
            },
        );
        tmp_id
    }

    /// Swap a provisional entry for the authoritative todo, moving it to
    /// the server-assigned date group when that differs.
    pub fn confirm_create(&mut self, tmp_id: &str, todo: Todo) {
        if !matches!(self.pending.remove(tmp_id), Some(PendingOp::Create { .. })) {
            return;
        }
        if let Some((_, index, mut entry)) = self.remove_entry(tmp_id) {
            let date = todo.created_date.clone();
            entry.todo = todo;
            let group = self.groups.entry(date).or_default();
            let index = index.min(group.len());
            group.insert(index, entry);
        }
    }

    /// Edit a todo in place, snapshotting the prior state. Returns the
    /// transaction's transient id, or `None` when the todo is unknown.
    pub fn apply_update(&mut self, id: &str, edit: impl FnOnce(&mut Todo)) -> Option<String> {
        let entry = self.find_mut(id)?;
        let prior = entry.todo.clone();
        edit(&mut entry.todo);
        let txn_id = transient_id();
        self.pending.insert(txn_id.clone(), PendingOp::Update { prior });
        Some(txn_id)
    }

    /// Remove a top-level entry, keeping it for rollback. Returns the
    /// transaction's transient id, or `None` when the todo is unknown.
    pub fn apply_delete(&mut self, id: &str) -> Option<String> {
        let (date, index, removed) = self.remove_entry(id)?;
        let txn_id = transient_id();
        self.pending.insert(
            txn_id.clone(),
            PendingOp::Delete {
                date,
                index,
                removed,
            },
        );
        Some(txn_id)
    }

    /// Drop the snapshot for a confirmed update or delete.
    pub fn confirm(&mut self, txn_id: &str) {
        self.pending.remove(txn_id);
    }

    /// Reconcile a confirmed update with the authoritative todo returned
    /// by the server.
    pub fn confirm_update(&mut self, txn_id: &str, todo: Todo) {
        if let Some(PendingOp::Update { prior }) = self.pending.remove(txn_id) {
            if let Some(entry) = self.find_mut(&prior.id) {
                entry.todo = todo;
            }
        }
    }

    /// Revert a pending mutation: remove a provisional create, restore the
    /// prior state of an update, or reinsert a deleted entry at its old
    /// position.
    pub fn rollback(&mut self, txn_id: &str) {
        match self.pending.remove(txn_id) {
            Some(PendingOp::Create { .. }) => {
                self.remove_entry(txn_id);
            }
            Some(PendingOp::Update { prior }) => {
                let id = prior.id.clone();
                if let Some(entry) = self.find_mut(&id) {
                    entry.todo = prior;
                }
            }
            Some(PendingOp::Delete {
                date,
                index,
                removed,
            }) => {
                self.insert_at(&date, index, removed);
            }
            None => {}
        }
    }
}

impl Default for OptimisticCache {
    fn default() -> Self {
        Self::new()
    }
}
