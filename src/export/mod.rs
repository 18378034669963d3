//! Snapshot export and import.
//!
//! A snapshot is one JSON document holding the whole forest as nested
//! trees. It can be kept under version control and loaded into any backend.

use crate::backend::{BackendResult, ParentFilter, TaskBackend};
use crate::forest::TaskForest;
use crate::types::{NewTask, TaskId, TaskTree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Version of the `tasks` table layout.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Export format version (semver).
pub const EXPORT_VERSION: &str = "1.0.0";

/// A structured export of every task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: i32,

    /// Export format version (semver)
    pub export_version: String,

    /// RFC 3339 timestamp of export
    pub exported_at: String,

    /// Tool name and version that created this export
    pub exported_by: String,

    /// Root tasks with their subtasks nested.
    #[serde(default)]
    pub tasks: Vec<TaskTree>,
}

impl Snapshot {
    /// Create a snapshot of `tasks` with current metadata.
    pub fn new(tasks: Vec<TaskTree>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            export_version: EXPORT_VERSION.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            exported_by: format!("eisenhower v{}", env!("CARGO_PKG_VERSION")),
            tasks,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let snapshot = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_schema_compatible(&self) -> bool {
        self.schema_version == CURRENT_SCHEMA_VERSION
    }

    /// Number of tasks at every depth.
    pub fn task_count(&self) -> usize {
        fn count(trees: &[TaskTree]) -> usize {
            trees.iter().map(|t| 1 + count(&t.children)).sum()
        }
        count(&self.tasks)
    }
}

/// Read every task from `backend` into a snapshot.
pub async fn export_snapshot<B>(backend: &B) -> BackendResult<Snapshot>
where
    B: TaskBackend + ?Sized,
{
    let rows = backend.select_tasks(ParentFilter::Any).await?;
    let forest = TaskForest::build(rows);
    debug!(tasks = forest.len(), "exporting snapshot");
    Ok(Snapshot::new(forest.to_trees()))
}

/// Outcome of [`import_snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    /// Snapshot id to newly assigned id.
    pub id_map: HashMap<TaskId, TaskId>,
}

/// Insert every task of `snapshot` into `backend`, parents before children.
///
/// The backend assigns fresh ids; `parent_id` links are rewritten to them.
/// Existing tasks are left alone. On error the tasks inserted so far remain.
pub async fn import_snapshot<B>(backend: &B, snapshot: &Snapshot) -> BackendResult<ImportSummary>
where
    B: TaskBackend + ?Sized,
{
    let mut summary = ImportSummary::default();
    let mut stack: Vec<(&TaskTree, Option<TaskId>)> =
        snapshot.tasks.iter().rev().map(|t| (t, None)).collect();

    while let Some((tree, parent_id)) = stack.pop() {
        let old = &tree.task;
        let inserted = backend
            .insert_task(NewTask {
                title: old.title.clone(),
                urgent: old.urgent,
                important: old.important,
                parent_id,
                completed: old.completed,
                notes: old.notes.clone(),
            })
            .await?;

        for child in tree.children.iter().rev() {
            stack.push((child, Some(inserted.id.clone())));
        }
        summary.id_map.insert(old.id.clone(), inserted.id);
        summary.imported += 1;
    }

    info!(imported = summary.imported, "snapshot imported");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::types::Quadrant;

    #[test]
    fn test_snapshot_new() {
        let snapshot = Snapshot::new(Vec::new());
        assert_eq!(snapshot.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(snapshot.export_version, EXPORT_VERSION);
        assert!(snapshot.is_schema_compatible());
        assert_eq!(snapshot.task_count(), 0);
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_database() {
        let source = Database::open_in_memory().unwrap();
        let parent = source
            .create_task(NewTask::new("Plan launch", Quadrant::UrgentImportant, None))
            .unwrap();
        let mut child = NewTask::new(
            "Book venue",
            Quadrant::NotUrgentImportant,
            Some(parent.id.clone()),
        );
        child.completed = true;
        child.notes = Some("call Tuesday".into());
        source.create_task(child).unwrap();

        let snapshot = export_snapshot(&source).await.unwrap();
        assert_eq!(snapshot.task_count(), 2);
        let json = snapshot.to_json_pretty().unwrap();
        let loaded = Snapshot::from_json(&json).unwrap();

        let target = Database::open_in_memory().unwrap();
        let summary = import_snapshot(&target, &loaded).await.unwrap();
        assert_eq!(summary.imported, 2);

        let rows = target.select_tasks(ParentFilter::Any).await.unwrap();
        let new_parent = &summary.id_map[&parent.id];
        let new_child = rows.iter().find(|t| t.title == "Book venue").unwrap();
        assert_eq!(new_child.parent_id.as_ref(), Some(new_parent));
        assert!(new_child.completed);
        assert_eq!(new_child.notes.as_deref(), Some("call Tuesday"));
        assert_eq!(new_child.quadrant(), Quadrant::NotUrgentImportant);
    }
}
