//! [`TaskBackend`] over the SQLite `tasks` table.
//!
//! rusqlite calls block, so every operation clones the handle and runs on the
//! blocking pool.

use super::{BackendError, BackendResult, ParentFilter, TaskBackend};
use crate::db::Database;
use crate::types::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use tracing::debug;

impl Database {
    async fn run_blocking<F, T>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(db))
            .await?
            .map_err(BackendError::from)
    }
}

#[async_trait]
impl TaskBackend for Database {
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>> {
        debug!(?filter, "select tasks");
        self.run_blocking(move |db| db.list_tasks(&filter)).await
    }

    async fn insert_task(&self, task: NewTask) -> BackendResult<Task> {
        debug!(title = %task.title, parent_id = ?task.parent_id, "insert task");
        self.run_blocking(move |db| db.create_task(task)).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task> {
        debug!(task_id = %id, ?patch, "update task");
        let id = id.to_string();
        self.run_blocking(move |db| db.update_task(&id, &patch)).await
    }

    async fn delete_task(&self, id: &str) -> BackendResult<()> {
        debug!(task_id = %id, "delete task");
        let id = id.to_string();
        self.run_blocking(move |db| db.delete_task(&id).map(|_| ()))
            .await
    }
}
