//! Persistence collaborators consumed by the task store.
//!
//! The store only needs four table-like operations: select with a parent
//! filter (ordered by creation time), insert one, update by id and delete by
//! id. Two implementations ship with the crate:
//! - [`crate::db::Database`]: a SQLite `tasks` table
//! - [`kv::KvBackend`]: a single serialized nested tree in a blob store

pub mod kv;
pub mod sqlite;

use crate::types::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Update addressed an id the backend does not know.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to (de)serialize stored data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data does not have the expected shape.
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Blocking worker panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Other unclassified error.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BackendError>() {
            Ok(backend_err) => backend_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sqlite_err) => Self::Database(sqlite_err),
                Err(err) => Self::Other(err.to_string()),
            },
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Parent filter for [`TaskBackend::select_tasks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFilter {
    /// Every task.
    Any,
    /// Tasks with no parent.
    Root,
    /// Direct children of the given task.
    Parent(TaskId),
}

impl ParentFilter {
    /// `None` selects roots, `Some(id)` selects children of `id`.
    pub fn children_of(parent_id: Option<&str>) -> Self {
        match parent_id {
            Some(id) => ParentFilter::Parent(id.to_string()),
            None => ParentFilter::Root,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            ParentFilter::Any => true,
            ParentFilter::Root => task.parent_id.is_none(),
            ParentFilter::Parent(id) => task.parent_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Table-like task persistence.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Select tasks matching `filter`, ordered by `created_at` ascending
    /// (ties keep insertion order).
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>>;

    /// Insert one task. The backend assigns `id` and `created_at`.
    async fn insert_task(&self, task: NewTask) -> BackendResult<Task>;

    /// Apply a partial update and return the updated row.
    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task>;

    /// Delete one row. Deleting an unknown id is not an error.
    async fn delete_task(&self, id: &str) -> BackendResult<()>;
}

#[async_trait]
impl<B: TaskBackend + ?Sized> TaskBackend for Arc<B> {
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>> {
        (**self).select_tasks(filter).await
    }

    async fn insert_task(&self, task: NewTask) -> BackendResult<Task> {
        (**self).insert_task(task).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task> {
        (**self).update_task(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> BackendResult<()> {
        (**self).delete_task(id).await
    }
}

#[async_trait]
impl<B: TaskBackend + ?Sized> TaskBackend for Box<B> {
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>> {
        (**self).select_tasks(filter).await
    }

    async fn insert_task(&self, task: NewTask) -> BackendResult<Task> {
        (**self).insert_task(task).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task> {
        (**self).update_task(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> BackendResult<()> {
        (**self).delete_task(id).await
    }
}

/// Sort rows the way every backend returns them. Stable, so equal
/// timestamps keep their incoming order.
pub(crate) fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.created_at);
}
