//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use eisenhower_tasks::backend::{BackendError, BackendResult, ParentFilter, TaskBackend};
use eisenhower_tasks::db::Database;
use eisenhower_tasks::types::{NewTask, Task, TaskPatch};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Helper to create a fresh in-memory database for testing.
pub fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

/// Remote calls seen by a [`FlakyBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub selects: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.selects + self.inserts + self.updates + self.deletes
    }
}

/// Wraps a backend, counting calls and failing on demand.
#[derive(Debug)]
pub struct FlakyBackend<B> {
    inner: B,
    selects: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    fail_selects: AtomicBool,
    fail_updates: AtomicBool,
    fail_inserts: AtomicBool,
    fail_delete_of: Mutex<Option<String>>,
}

impl<B> FlakyBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            selects: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_selects: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            fail_delete_of: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            selects: self.selects.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make deleting `id` fail; every other delete still succeeds.
    pub fn fail_delete_of(&self, id: Option<&str>) {
        *self.fail_delete_of.lock().unwrap() = id.map(str::to_string);
    }
}

fn outage() -> BackendError {
    BackendError::Other("simulated outage".to_string())
}

#[async_trait]
impl<B: TaskBackend> TaskBackend for FlakyBackend<B> {
    async fn select_tasks(&self, filter: ParentFilter) -> BackendResult<Vec<Task>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.select_tasks(filter).await
    }

    async fn insert_task(&self, task: NewTask) -> BackendResult<Task> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.insert_task(task).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> BackendResult<Task> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.update_task(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> BackendResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_delete_of.lock().unwrap().as_deref() == Some(id);
        if fail {
            return Err(outage());
        }
        self.inner.delete_task(id).await
    }
}
