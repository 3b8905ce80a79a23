//! Integration tests for the storage layer.
//!
//! Exercises the `TodoStore` contract through a trait object backed by an
//! in-memory SQLite database, the same seam the API handlers use.

use daylist::db::Database;
use daylist::store::TodoStore;
use daylist::types::{CreateTodo, TodoStatus, UpdateTodo};
use std::sync::Arc;

/// Helper to create a fresh in-memory store for testing.
fn setup_store() -> Arc<dyn TodoStore> {
    Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

fn create_on(store: &Arc<dyn TodoStore>, title: &str, date: &str) -> daylist::types::Todo {
    store
        .create_todo(CreateTodo {
            title: title.to_string(),
            created_date: Some(date.to_string()),
            ..Default::default()
        })
        .expect("Failed to create todo")
}

mod todo_lifecycle {
    use super::*;

    #[test]
    fn created_todo_is_pending_with_generated_id() {
        let store = setup_store();
        let todo = create_on(&store, "Water plants", "2024-03-01");

        assert!(!todo.id.is_empty());
        assert_eq!(todo.status, TodoStatus::Pending);
        assert_eq!(todo.title, "Water plants");
        assert!(todo.completed_at.is_none());
    }

    #[test]
    fn completed_at_follows_done_transitions() {
        let store = setup_store();
        let todo = create_on(&store, "Ship release", "2024-03-01");

        let done = store
            .update_todo(
                &todo.id,
                UpdateTodo {
                    status: Some(TodoStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(done.status, TodoStatus::Done);
        assert!(done.completed_at.is_some());

        let cancelled = store
            .update_todo(
                &todo.id,
                UpdateTodo {
                    status: Some(TodoStatus::Cancelled),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, TodoStatus::Cancelled);
        assert!(cancelled.completed_at.is_none());
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let store = setup_store();
        let todo = create_on(&store, "Original", "2024-03-01");

        let updated = store
            .update_todo(
                &todo.id,
                UpdateTodo {
                    note: Some("remember the charger".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Original");
        assert_eq!(updated.note.as_deref(), Some("remember the charger"));
        assert_eq!(updated.status, TodoStatus::Pending);
        assert_eq!(updated.created_date, "2024-03-01");
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let store = setup_store();
        assert!(
            store
                .update_todo("nope", UpdateTodo::default())
                .unwrap()
                .is_none()
        );
        assert!(store.soft_delete_todo("nope").unwrap().is_none());
    }
}

mod soft_delete {
    use super::*;

    #[test]
    fn deleted_rows_disappear_from_every_list_path() {
        let store = setup_store();
        let parent = create_on(&store, "Parent", "2024-03-01");
        let child = store
            .create_todo(CreateTodo {
                title: "Child".into(),
                parent_id: Some(parent.id.clone()),
                created_date: Some("2024-03-01".into()),
            })
            .unwrap();
        let bystander = create_on(&store, "Unrelated", "2024-03-01");

        store.soft_delete_todo(&parent.id).unwrap().unwrap();

        let top = store.list_top_level(None).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, bystander.id);
        assert!(store.list_children(&parent.id).unwrap().is_empty());

        // Status-filtered listing can never resurface tombstones.
        assert!(
            store
                .list_top_level(Some(TodoStatus::Deleted))
                .unwrap()
                .is_empty()
        );

        // Direct id lookup still sees the tombstones (internal use only).
        assert_eq!(
            store.get_todo(&parent.id).unwrap().unwrap().status,
            TodoStatus::Deleted
        );
        assert_eq!(
            store.get_todo(&child.id).unwrap().unwrap().status,
            TodoStatus::Deleted
        );
    }

    #[test]
    fn cascade_only_touches_the_target_subtree() {
        let store = setup_store();
        let a = create_on(&store, "A", "2024-03-01");
        let b = create_on(&store, "B", "2024-03-01");
        store
            .create_todo(CreateTodo {
                title: "B child".into(),
                parent_id: Some(b.id.clone()),
                created_date: Some("2024-03-01".into()),
            })
            .unwrap();

        store.soft_delete_todo(&a.id).unwrap().unwrap();

        let top = store.list_top_level(None).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, b.id);
        assert_eq!(store.list_children(&b.id).unwrap().len(), 1);
    }
}

mod ordering {
    use super::*;

    // Creation timestamps are millisecond-granular; space the inserts out
    // so created_at tiebreaks are deterministic.
    fn pause() {
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    #[test]
    fn top_level_is_date_descending_then_creation_ascending() {
        let store = setup_store();
        let first_old = create_on(&store, "first old", "2024-03-01");
        pause();
        let second_old = create_on(&store, "second old", "2024-03-01");
        pause();
        let newer = create_on(&store, "newer", "2024-03-02");

        let listed = store.list_top_level(None).unwrap();
        let ids: Vec<_> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![newer.id.as_str(), first_old.id.as_str(), second_old.id.as_str()]
        );
    }

    #[test]
    fn children_keep_insertion_order() {
        let store = setup_store();
        let parent = create_on(&store, "Parent", "2024-03-01");
        for title in ["one", "two", "three"] {
            store
                .create_todo(CreateTodo {
                    title: title.into(),
                    parent_id: Some(parent.id.clone()),
                    created_date: Some("2024-03-01".into()),
                })
                .unwrap();
            pause();
        }

        let children = store.list_children(&parent.id).unwrap();
        let titles: Vec<_> = children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }
}

mod persistence {
    use super::*;

    #[test]
    fn data_survives_reopening_the_database_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("daylist.db");
        let path = path.to_str().unwrap();

        let id = {
            let store: Arc<dyn TodoStore> =
                Arc::new(Database::open(path).expect("Failed to open database"));
            let todo = create_on(&store, "Persisted", "2024-03-01");
            store.put_setting("glean_instance", "acme").unwrap();
            todo.id
        };

        // Reopening runs migrations again; they must be idempotent.
        let store: Arc<dyn TodoStore> =
            Arc::new(Database::open(path).expect("Failed to reopen database"));
        let todo = store.get_todo(&id).unwrap().unwrap();
        assert_eq!(todo.title, "Persisted");
        assert_eq!(
            store.get_setting("glean_instance").unwrap().as_deref(),
            Some("acme")
        );
    }
}

mod settings {
    use super::*;

    #[test]
    fn settings_upsert_and_read_back() {
        let store = setup_store();
        assert!(store.get_setting("glean_instance").unwrap().is_none());

        store.put_setting("glean_instance", "acme").unwrap();
        assert_eq!(
            store.get_setting("glean_instance").unwrap().as_deref(),
            Some("acme")
        );

        store.put_setting("glean_instance", "acme-eu").unwrap();
        assert_eq!(
            store.get_setting("glean_instance").unwrap().as_deref(),
            Some("acme-eu")
        );
    }
}
