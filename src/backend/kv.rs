//! [`TaskBackend`] over a blob key-value store.
//!
//! The whole task forest lives under one key as a serialized nested tree.
//! Every mutation is a read-modify-write of that value, using recursive
//! helpers that insert, update or remove a node addressed by id.

use super::{BackendError, BackendResult, ParentFilter, TaskBackend, sort_by_creation};
use crate::db::now_ms;
use crate::types::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Key under which the forest is stored.
pub const DEFAULT_KEY: &str = "tasks";

/// Minimal async blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> BackendResult<()>;
}

/// Blob store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Blob store writing one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Stored node of the nested tree. Parent links are implied by nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub subtasks: Vec<NestedTask>,
}

impl NestedTask {
    fn to_task(&self, parent_id: Option<&str>) -> Task {
        Task {
            id: self.id.clone(),
            title: self.title.clone(),
            urgent: self.urgent,
            important: self.important,
            completed: self.completed,
            notes: self.notes.clone(),
            created_at: self.created_at,
            parent_id: parent_id.map(str::to_string),
        }
    }

    fn apply(&mut self, patch: &TaskPatch) {
        let mut task = self.to_task(None);
        task.apply(patch);
        self.title = task.title;
        self.urgent = task.urgent;
        self.important = task.important;
        self.completed = task.completed;
        self.notes = task.notes;
    }
}

/// Append `node` under `parent_id`. Returns false if the parent is absent.
pub fn add_to_hierarchy(tasks: &mut [NestedTask], parent_id: &str, node: NestedTask) -> bool {
    let mut pending = Some(node);
    add_recursive(tasks, parent_id, &mut pending);
    pending.is_none()
}

fn add_recursive(tasks: &mut [NestedTask], parent_id: &str, pending: &mut Option<NestedTask>) {
    for task in tasks {
        if pending.is_none() {
            return;
        }
        if task.id == parent_id {
            if let Some(node) = pending.take() {
                task.subtasks.push(node);
            }
            return;
        }
        add_recursive(&mut task.subtasks, parent_id, pending);
    }
}

/// Patch the node with `task_id`. Returns the updated row with its parent id.
pub fn update_in_hierarchy(
    tasks: &mut [NestedTask],
    task_id: &str,
    patch: &TaskPatch,
    parent_id: Option<&str>,
) -> Option<Task> {
    for task in tasks.iter_mut() {
        if task.id == task_id {
            task.apply(patch);
            return Some(task.to_task(parent_id));
        }
    }
    for task in tasks.iter_mut() {
        let parent = task.id.clone();
        if let Some(updated) = update_in_hierarchy(&mut task.subtasks, task_id, patch, Some(&parent))
        {
            return Some(updated);
        }
    }
    None
}

/// Remove the node with `task_id` (and anything still nested under it).
pub fn remove_from_hierarchy(tasks: &mut Vec<NestedTask>, task_id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|t| t.id != task_id);
    if tasks.len() != before {
        return true;
    }
    tasks
        .iter_mut()
        .any(|t| remove_from_hierarchy(&mut t.subtasks, task_id))
}

/// Flatten the nested tree into rows, pre-order.
pub fn flatten_hierarchy(tasks: &[NestedTask]) -> Vec<Task> {
    fn walk(tasks: &[NestedTask], parent_id: Option<&str>, out: &mut Vec<Task>) {
        for task in tasks {
            out.push(task.to_task(parent_id));
            walk(&task.subtasks, Some(&task.id), out);
        }
    }

    let mut out = Vec::new();
    walk(tasks, None, &mut out);
    out
}

/// Task backend storing the forest as one blob.
pub struct KvBackend<S> {
    store: S,
    key: String,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl<S: BlobStore> KvBackend<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn blob_store(&self) -> &S {
        &self.store
    }

    /// Read the whole forest. A missing value reads as empty.
    pub async fn get_tasks(&self) -> BackendResult<Vec<NestedTask>> {
        match self.store.get(&self.key).await? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|e| BackendError::Corrupt(format!("{}: {}", self.key, e))),
            _ => Ok(Vec::new()),
        }
    }

    /// Overwrite the whole forest.
    pub async fn save_tasks(&self, tasks: &[NestedTask]) -> BackendResult<()> {
        let raw = serde_json::to_string(tasks)?;
        self.store.set(&self.key, raw).await
    }
}

#[async_trait]
impl<S: BlobStore> TaskBackend for KvBackend<S> {
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>> {
        debug!(key = %self.key, ?filter, "kv select tasks");
        let tree = self.get_tasks().await?;
        let mut tasks: Vec<Task> = flatten_hierarchy(&tree)
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        sort_by_creation(&mut tasks);
        Ok(tasks)
    }

    async fn insert_task(&self, task: NewTask) -> BackendResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tree = self.get_tasks().await?;

        let node = NestedTask {
            id: Uuid::now_v7().to_string(),
            title: task.title,
            urgent: task.urgent,
            important: task.important,
            completed: task.completed,
            notes: task.notes,
            created_at: now_ms(),
            subtasks: Vec::new(),
        };
        let row = node.to_task(task.parent_id.as_deref());

        match task.parent_id.as_deref() {
            None => tree.push(node),
            Some(parent_id) => {
                if !add_to_hierarchy(&mut tree, parent_id, node) {
                    return Err(BackendError::NotFound(parent_id.to_string()));
                }
            }
        }

        self.save_tasks(&tree).await?;
        debug!(key = %self.key, task_id = %row.id, "kv insert task");
        Ok(row)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tree = self.get_tasks().await?;
        let updated = update_in_hierarchy(&mut tree, id, &patch, None)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        self.save_tasks(&tree).await?;
        debug!(key = %self.key, task_id = %id, "kv update task");
        Ok(updated)
    }

    async fn delete_task(&self, id: &str) -> BackendResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tree = self.get_tasks().await?;
        if remove_from_hierarchy(&mut tree, id) {
            self.save_tasks(&tree).await?;
            debug!(key = %self.key, task_id = %id, "kv delete task");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, subtasks: Vec<NestedTask>) -> NestedTask {
        NestedTask {
            id: id.to_string(),
            title: id.to_uppercase(),
            urgent: false,
            important: false,
            completed: false,
            notes: None,
            created_at: 0,
            subtasks,
        }
    }

    fn sample() -> Vec<NestedTask> {
        vec![
            node("a", vec![node("a1", vec![node("a1x", vec![])]), node("a2", vec![])]),
            node("b", vec![]),
        ]
    }

    #[test]
    fn add_finds_nested_parent() {
        let mut tree = sample();
        assert!(add_to_hierarchy(&mut tree, "a1x", node("new", vec![])));
        assert_eq!(tree[0].subtasks[0].subtasks[0].subtasks[0].id, "new");
        assert!(!add_to_hierarchy(&mut tree, "zzz", node("lost", vec![])));
    }

    #[test]
    fn update_reports_parent_id() {
        let mut tree = sample();
        let updated = update_in_hierarchy(&mut tree, "a2", &TaskPatch::completed(true), None)
            .expect("a2 exists");
        assert!(updated.completed);
        assert_eq!(updated.parent_id.as_deref(), Some("a"));
        assert!(tree[0].subtasks[1].completed);
        assert!(update_in_hierarchy(&mut tree, "nope", &TaskPatch::title("x"), None).is_none());
    }

    #[test]
    fn remove_drops_nested_node() {
        let mut tree = sample();
        assert!(remove_from_hierarchy(&mut tree, "a1x"));
        assert!(tree[0].subtasks[0].subtasks.is_empty());
        assert!(!remove_from_hierarchy(&mut tree, "a1x"));
        assert!(remove_from_hierarchy(&mut tree, "b"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn flatten_links_parents() {
        let rows = flatten_hierarchy(&sample());
        let ids: Vec<&str> = rows.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
        assert_eq!(rows[2].parent_id.as_deref(), Some("a1"));
        assert!(rows[4].parent_id.is_none());
    }

    #[tokio::test]
    async fn missing_blob_reads_as_empty() {
        let backend = KvBackend::new(MemoryBlobStore::new());
        assert!(backend.get_tasks().await.unwrap().is_empty());
        assert!(
            backend
                .select_tasks(ParentFilter::Any)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn corrupt_blob_is_reported() {
        let store = MemoryBlobStore::new();
        store.set(DEFAULT_KEY, "{not json".to_string()).await.unwrap();
        let backend = KvBackend::new(store);
        assert!(matches!(
            backend.get_tasks().await,
            Err(BackendError::Corrupt(_))
        ));
    }
}
