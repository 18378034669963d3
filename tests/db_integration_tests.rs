//! Integration tests for the database layer.
//!
//! These tests verify the `tasks` table operations and the async backend
//! wrapper using an in-memory SQLite database.

mod common;

use common::setup_db;
use eisenhower_tasks::backend::{BackendError, ParentFilter, TaskBackend};
use eisenhower_tasks::db::Database;
use eisenhower_tasks::types::{NewTask, Quadrant, TaskPatch};
use tempfile::TempDir;

mod task_tests {
    use super::*;

    #[test]
    fn create_task_with_minimal_fields() {
        let db = setup_db();

        let task = db
            .create_task(NewTask::new("Write report", Quadrant::NotUrgentImportant, None))
            .expect("Failed to create task");

        assert_eq!(task.title, "Write report");
        assert!(!task.urgent);
        assert!(task.important);
        assert!(!task.completed);
        assert!(task.notes.is_none());
        assert!(task.parent_id.is_none());
        assert!(task.created_at > 0);
        assert_eq!(task.id.len(), 36);
    }

    #[test]
    fn create_task_with_all_fields() {
        let db = setup_db();
        let parent = db
            .create_task(NewTask::new("Parent", Quadrant::UrgentImportant, None))
            .unwrap();

        let mut input = NewTask::new("Child", Quadrant::UrgentNotImportant, Some(parent.id.clone()));
        input.completed = true;
        input.notes = Some("done already".to_string());
        let child = db.create_task(input).unwrap();

        let stored = db.get_task(&child.id).unwrap().expect("Task should exist");
        assert_eq!(stored, child);
        assert_eq!(stored.parent_id.as_deref(), Some(parent.id.as_str()));
        assert_eq!(stored.quadrant(), Quadrant::UrgentNotImportant);
    }

    #[test]
    fn get_task_returns_none_for_unknown_id() {
        let db = setup_db();
        assert!(db.get_task("nonexistent").unwrap().is_none());
    }

    #[test]
    fn list_tasks_keeps_creation_order() {
        let db = setup_db();
        let titles = ["one", "two", "three", "four"];
        for title in titles {
            db.create_task(NewTask::new(title, Quadrant::UrgentImportant, None))
                .unwrap();
        }

        let listed: Vec<String> = db
            .list_tasks(&ParentFilter::Root)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(listed, titles);
    }

    #[test]
    fn child_ids_lists_direct_children_only() {
        let db = setup_db();
        let root = db
            .create_task(NewTask::new("Root", Quadrant::UrgentImportant, None))
            .unwrap();
        let child = db
            .create_task(NewTask::new("Child", Quadrant::UrgentImportant, Some(root.id.clone())))
            .unwrap();
        db.create_task(NewTask::new("Grandchild", Quadrant::UrgentImportant, Some(child.id.clone())))
            .unwrap();

        assert_eq!(db.child_ids(&root.id).unwrap(), vec![child.id]);
    }

    #[test]
    fn update_task_applies_partial_patch() {
        let db = setup_db();
        let task = db
            .create_task(NewTask::new("Draft", Quadrant::UrgentImportant, None))
            .unwrap();

        let updated = db
            .update_task(&task.id, &TaskPatch::quadrant(Quadrant::NotUrgentNotImportant))
            .unwrap();
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.quadrant(), Quadrant::NotUrgentNotImportant);

        let updated = db.update_task(&task.id, &TaskPatch::notes(Some("x".into()))).unwrap();
        assert_eq!(updated.notes.as_deref(), Some("x"));
        let updated = db.update_task(&task.id, &TaskPatch::notes(None)).unwrap();
        assert!(updated.notes.is_none());
        assert_eq!(updated.created_at, task.created_at);
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn file_database_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.db");

        let id = {
            let db = Database::open(&path).expect("Failed to open database");
            db.create_task(NewTask::new("Persist me", Quadrant::UrgentImportant, None))
                .unwrap()
                .id
        };

        let db = Database::open(&path).expect("Failed to reopen database");
        let task = db.get_task(&id).unwrap().expect("Task should persist");
        assert_eq!(task.title, "Persist me");
    }
}

mod backend_tests {
    use super::*;

    #[tokio::test]
    async fn select_tasks_filters_by_parent() {
        let db = setup_db();
        let root = db
            .insert_task(NewTask::new("Root", Quadrant::UrgentImportant, None))
            .await
            .unwrap();
        let child = db
            .insert_task(NewTask::new("Child", Quadrant::UrgentImportant, Some(root.id.clone())))
            .await
            .unwrap();

        let roots = db.select_tasks(ParentFilter::Root).await.unwrap();
        let children = db
            .select_tasks(ParentFilter::Parent(root.id.clone()))
            .await
            .unwrap();
        let all = db.select_tasks(ParentFilter::Any).await.unwrap();

        assert_eq!(roots, vec![root]);
        assert_eq!(children, vec![child]);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn insert_under_unknown_parent_is_not_found() {
        let db = setup_db();

        let err = db
            .insert_task(NewTask::new("Orphan", Quadrant::UrgentImportant, Some("ghost".into())))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::NotFound(ref id) if id == "ghost"));
        assert!(db.select_tasks(ParentFilter::Any).await.unwrap().is_empty());
        assert_eq!(db.count_dangling().unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_under_deleted_parent_is_not_found() {
        let db = setup_db();
        let parent = db
            .insert_task(NewTask::new("Parent", Quadrant::UrgentImportant, None))
            .await
            .unwrap();
        TaskBackend::delete_task(&db, &parent.id).await.unwrap();

        let err = db
            .insert_task(NewTask::new("Late child", Quadrant::UrgentImportant, Some(parent.id.clone())))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::NotFound(ref id) if *id == parent.id));
        assert_eq!(db.count_dangling().unwrap(), 0);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let db = setup_db();

        let err = TaskBackend::update_task(&db, "ghost", TaskPatch::completed(true))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::NotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_an_error() {
        let db = setup_db();
        TaskBackend::delete_task(&db, "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_only_the_row() {
        let db = setup_db();
        let root = db
            .insert_task(NewTask::new("Root", Quadrant::UrgentImportant, None))
            .await
            .unwrap();
        db.insert_task(NewTask::new("Child", Quadrant::UrgentImportant, Some(root.id.clone())))
            .await
            .unwrap();

        TaskBackend::delete_task(&db, &root.id).await.unwrap();

        assert_eq!(db.select_tasks(ParentFilter::Any).await.unwrap().len(), 1);
        assert_eq!(db.count_dangling().unwrap(), 1);
    }
}
