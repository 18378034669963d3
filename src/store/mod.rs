//! The task store: single point of truth between user actions and the backend.
//!
//! Holds two views of the data:
//! - a navigable [`Hierarchy`] showing one level of children at a time
//! - a [`TaskForest`] with every task, rebuilt wholesale after mutations
//!
//! Only completion toggling is optimistic. Every other mutation is applied
//! locally after the backend confirms it.

pub mod events;
pub mod hierarchy;
pub mod optimistic;

pub use events::{EventBus, StoreEvent};
pub use hierarchy::{Hierarchy, HierarchyLevel};
pub use optimistic::MutationState;

use crate::backend::{ParentFilter, TaskBackend};
use crate::error::{StoreError, StoreResult};
use crate::forest::{SearchHit, TaskForest};
use crate::stats::Stats;
use crate::types::{NewTask, Quadrant, QuadrantBuckets, SubtaskCounts, Task, TaskId, TaskPatch};
use optimistic::{run_confirmed, run_optimistic};
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Title of the root hierarchy level.
pub const DEFAULT_ROOT_TITLE: &str = "Main Tasks";

/// Whether the first load has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
}

/// Client-side display state: the level stack and the details-view copy.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub hierarchy: Hierarchy,
    pub open_task: Option<Task>,
}

impl ViewState {
    /// Apply `f` to the current level's copy and the details copy of `id`.
    fn update_copies(&mut self, id: &str, mut f: impl FnMut(&mut Task)) {
        if let Some(task) = self
            .hierarchy
            .current_mut()
            .and_then(|level| level.task_mut(id))
        {
            f(task);
        }
        if let Some(task) = self.open_task.as_mut().filter(|t| t.id == id) {
            f(task);
        }
    }

    fn set_completed(&mut self, id: &str, completed: bool) {
        self.update_copies(id, |t| t.completed = completed);
    }
}

/// Task store over a [`TaskBackend`].
pub struct TaskStore<B> {
    backend: B,
    view: ViewState,
    forest: TaskForest,
    status: LoadStatus,
    last_error: Option<StoreError>,
    last_mutation: MutationState,
    events: EventBus,
    root_title: String,
}

impl<B: TaskBackend> TaskStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            view: ViewState::default(),
            forest: TaskForest::default(),
            status: LoadStatus::Loading,
            last_error: None,
            last_mutation: MutationState::Idle,
            events: EventBus::new(),
            root_title: DEFAULT_ROOT_TITLE.to_string(),
        }
    }

    pub fn with_root_title(mut self, title: impl Into<String>) -> Self {
        self.root_title = title.into();
        self
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.view.hierarchy
    }

    pub fn current_level(&self) -> Option<&HierarchyLevel> {
        self.view.hierarchy.current()
    }

    /// Tasks of the displayed level (empty before the first load).
    pub fn current_tasks(&self) -> &[Task] {
        self.current_level().map(|l| l.tasks.as_slice()).unwrap_or(&[])
    }

    pub fn forest(&self) -> &TaskForest {
        &self.forest
    }

    pub fn open_task(&self) -> Option<&Task> {
        self.view.open_task.as_ref()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<StoreError> {
        self.last_error.take()
    }

    pub fn last_mutation(&self) -> MutationState {
        self.last_mutation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Locally known copy of a task: current level, details view, then forest.
    pub fn local_task(&self, id: &str) -> Option<&Task> {
        self.current_level()
            .and_then(|l| l.task(id))
            .or_else(|| self.view.open_task.as_ref().filter(|t| t.id == id))
            .or_else(|| self.forest.get(id))
    }

    /// Record and broadcast a failure, then hand it back for propagation.
    fn surface(&mut self, err: StoreError) -> StoreError {
        warn!(code = ?err.code, error = %err, "task store operation failed");
        self.events.emit(StoreEvent::Error {
            message: err.user_message(),
        });
        self.last_error = Some(err.clone());
        err
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Initial load: root level plus the full forest.
    pub async fn load(&mut self) -> StoreResult<()> {
        self.status = LoadStatus::Loading;
        let roots = self.fetch_children(None).await?;
        self.view.hierarchy = Hierarchy::new(HierarchyLevel::root(self.root_title.clone(), roots));
        self.view.open_task = None;
        self.fetch_all().await?;
        self.status = LoadStatus::Ready;
        info!(tasks = self.forest.len(), "task store loaded");
        Ok(())
    }

    /// Tasks whose parent is `parent_id` (roots for `None`), oldest first.
    pub async fn fetch_children(&mut self, parent_id: Option<&str>) -> StoreResult<Vec<Task>> {
        let filter = ParentFilter::children_of(parent_id);
        match self.backend.select_tasks(filter).await {
            Ok(tasks) => Ok(tasks),
            Err(e) => Err(self.surface(e.into())),
        }
    }

    /// Re-read every task and rebuild the forest. On failure the previous
    /// forest stays in place.
    pub async fn fetch_all(&mut self) -> StoreResult<&TaskForest> {
        match self.backend.select_tasks(ParentFilter::Any).await {
            Ok(rows) => {
                self.forest = TaskForest::build(rows);
                self.events.emit(StoreEvent::Refreshed {
                    task_count: self.forest.len(),
                });
                debug!(tasks = self.forest.len(), "forest rebuilt");
                Ok(&self.forest)
            }
            Err(e) => Err(self.surface(e.into())),
        }
    }

    /// Refresh after a confirmed mutation. The mutation already succeeded,
    /// so a failed refresh is surfaced but not returned.
    async fn refresh_after_mutation(&mut self) {
        let _ = self.fetch_all().await;
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Create a task. A blank title is refused silently with `Ok(None)`.
    ///
    /// The new row is appended to the displayed level when it belongs there.
    pub async fn create_task(
        &mut self,
        title: &str,
        urgent: bool,
        important: bool,
        parent_id: Option<TaskId>,
    ) -> StoreResult<Option<Task>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("refusing to create a task with a blank title");
            return Ok(None);
        }

        let input = NewTask {
            title: title.to_string(),
            urgent,
            important,
            parent_id,
            completed: false,
            notes: None,
        };

        let Self {
            backend,
            view,
            last_mutation,
            ..
        } = self;
        let result = run_confirmed(
            view,
            last_mutation,
            async { backend.insert_task(input).await.map_err(StoreError::from) },
            |view, task: &Task| {
                if let Some(level) = view.hierarchy.current_mut() {
                    if level.id == task.parent_id {
                        level.tasks.push(task.clone());
                    }
                }
            },
        )
        .await;

        match result {
            Ok(task) => {
                info!(task_id = %task.id, title = %task.title, quadrant = %task.quadrant(), "task created");
                self.refresh_after_mutation().await;
                Ok(Some(task))
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Create a task in the displayed level from a quadrant label.
    /// Unknown labels land in "Not Urgent & Not Important".
    pub async fn add_new_task(&mut self, title: &str, quadrant_label: &str) -> StoreResult<Option<Task>> {
        let (urgent, important) = Quadrant::flags_for_label(quadrant_label);
        let parent_id = self.view.hierarchy.current_id().map(str::to_string);
        self.create_task(title, urgent, important, parent_id).await
    }

    /// Rename a task. A blank title is refused silently with `Ok(false)`.
    /// The forest is not refreshed; it catches up on the next [`fetch_all`](Self::fetch_all).
    pub async fn rename_task(&mut self, id: &str, new_title: &str) -> StoreResult<bool> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            debug!(task_id = %id, "refusing to rename a task to a blank title");
            return Ok(false);
        }

        let patch = TaskPatch::title(new_title);
        let Self {
            backend,
            view,
            last_mutation,
            ..
        } = self;
        let result = run_confirmed(
            view,
            last_mutation,
            async { backend.update_task(id, patch).await.map_err(StoreError::from) },
            |view, updated: &Task| view.update_copies(id, |t| t.title = updated.title.clone()),
        )
        .await;

        match result {
            Ok(_) => {
                info!(task_id = %id, title = %new_title, "task renamed");
                Ok(true)
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Replace a task's note. An empty note clears it.
    pub async fn edit_note(&mut self, id: &str, note: &str) -> StoreResult<()> {
        let notes = if note.trim().is_empty() {
            None
        } else {
            Some(note.to_string())
        };

        let patch = TaskPatch::notes(notes);
        let Self {
            backend,
            view,
            last_mutation,
            ..
        } = self;
        let result = run_confirmed(
            view,
            last_mutation,
            async { backend.update_task(id, patch).await.map_err(StoreError::from) },
            |view, updated: &Task| view.update_copies(id, |t| t.notes = updated.notes.clone()),
        )
        .await;

        match result {
            Ok(_) => {
                info!(task_id = %id, "task note updated");
                Ok(())
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Flip `completed` optimistically. Returns the new value.
    ///
    /// Emits [`StoreEvent::Completed`] as soon as a task is checked off. If
    /// the backend rejects the update the flip is rolled back.
    pub async fn toggle_completion(&mut self, id: &str) -> StoreResult<bool> {
        let (previous, title) = match self.local_task(id) {
            Some(task) => (task.completed, task.title.clone()),
            None => return Err(StoreError::task_not_found(id)),
        };
        let target = !previous;

        let Self {
            backend,
            view,
            last_mutation,
            events,
            ..
        } = self;
        let result = run_optimistic(
            view,
            last_mutation,
            |view| {
                view.set_completed(id, target);
                if target {
                    events.emit(StoreEvent::Completed {
                        task_id: id.to_string(),
                        title,
                    });
                }
                previous
            },
            |view, previous| view.set_completed(id, previous),
            async {
                backend
                    .update_task(id, TaskPatch::completed(target))
                    .await
                    .map_err(StoreError::from)
            },
        )
        .await;

        match result {
            Ok(updated) => {
                info!(task_id = %id, completed = updated.completed, "task completion toggled");
                self.view.set_completed(id, updated.completed);
                self.refresh_after_mutation().await;
                Ok(updated.completed)
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Move a task to another quadrant.
    pub async fn move_task(&mut self, id: &str, quadrant: Quadrant) -> StoreResult<()> {
        let patch = TaskPatch::quadrant(quadrant);
        let Self {
            backend,
            view,
            last_mutation,
            ..
        } = self;
        let result = run_confirmed(
            view,
            last_mutation,
            async { backend.update_task(id, patch).await.map_err(StoreError::from) },
            |view, updated: &Task| {
                view.update_copies(id, |t| {
                    t.urgent = updated.urgent;
                    t.important = updated.important;
                })
            },
        )
        .await;

        match result {
            Ok(_) => {
                info!(task_id = %id, quadrant = %quadrant, "task moved");
                self.refresh_after_mutation().await;
                Ok(())
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    /// Delete a task and its whole subtree, children before parents.
    ///
    /// Descendants are discovered with one backend query per task. Returns
    /// the deleted ids in deletion order; ids not known locally are
    /// rejected without a backend call. Levels opened on a deleted task are
    /// closed. If a delete fails part way, the
    /// rows already removed are still dropped from local state.
    pub async fn delete_task_cascade(&mut self, id: &str) -> StoreResult<Vec<TaskId>> {
        if self.local_task(id).is_none() {
            return Err(StoreError::task_not_found(id));
        }
        self.last_mutation = MutationState::Pending;

        let order = match self.collect_subtree(id).await {
            Ok(order) => order,
            Err(e) => {
                self.last_mutation = MutationState::Failed;
                return Err(self.surface(e));
            }
        };

        let mut deleted = Vec::with_capacity(order.len());
        let mut failure = None;
        for task_id in order {
            match self.backend.delete_task(&task_id).await {
                Ok(()) => deleted.push(task_id),
                Err(e) => {
                    failure = Some(StoreError::from(e).with_details(format!("task_id={}", task_id)));
                    break;
                }
            }
        }

        self.forget_local(&deleted);
        self.refresh_after_mutation().await;

        match failure {
            None => {
                self.last_mutation = MutationState::Applied;
                info!(task_id = %id, removed = deleted.len(), "task subtree deleted");
                Ok(deleted)
            }
            Some(e) => {
                self.last_mutation = MutationState::Failed;
                Err(self.surface(e))
            }
        }
    }

    /// Post-order ids of `id`'s subtree, `id` last.
    async fn collect_subtree(&self, id: &str) -> StoreResult<Vec<TaskId>> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(id.to_string(), false)];

        while let Some((task_id, expanded)) = stack.pop() {
            if expanded {
                order.push(task_id);
                continue;
            }
            if !seen.insert(task_id.clone()) {
                continue;
            }
            let children = self
                .backend
                .select_tasks(ParentFilter::Parent(task_id.clone()))
                .await?;
            stack.push((task_id, true));
            for child in children.into_iter().rev() {
                stack.push((child.id, false));
            }
        }

        Ok(order)
    }

    fn forget_local(&mut self, ids: &[TaskId]) {
        if ids.is_empty() {
            return;
        }
        if self.view.hierarchy.forget(ids) {
            debug!(depth = self.view.hierarchy.len(), "left levels of deleted tasks");
        }
        if self
            .view
            .open_task
            .as_ref()
            .is_some_and(|t| ids.contains(&t.id))
        {
            self.view.open_task = None;
        }
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Open a task's matrix: fetch its children and push a level.
    /// On failure the hierarchy is left untouched.
    pub async fn navigate_into(&mut self, task_id: &str) -> StoreResult<()> {
        let task = self
            .local_task(task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))?;
        let children = self.fetch_children(Some(&task.id)).await?;
        self.view.hierarchy.push(HierarchyLevel::for_task(&task, children));
        debug!(task_id = %task.id, depth = self.view.hierarchy.len(), "navigated into task");
        Ok(())
    }

    /// Go up one level. No-op at the root.
    pub fn navigate_back(&mut self) -> bool {
        self.view.hierarchy.pop()
    }

    /// Truncate to the breadcrumb at `index`. Out-of-range is a no-op.
    pub fn navigate_to_breadcrumb(&mut self, index: usize) -> bool {
        self.view.hierarchy.truncate_to(index)
    }

    /// Back to the root level.
    pub fn navigate_home(&mut self) {
        self.view.hierarchy.reset();
    }

    /// Jump straight to a task known to the forest, rebuilding the
    /// breadcrumb from its ancestry.
    pub async fn navigate_to(&mut self, task_id: &str) -> StoreResult<()> {
        let target = self
            .forest
            .get(task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))?;
        let mut path: Vec<Task> = self.forest.ancestors(task_id).into_iter().cloned().collect();
        path.push(target);

        let roots = self.fetch_children(None).await?;
        let mut levels = vec![HierarchyLevel::root(self.root_title.clone(), roots)];
        for task in &path {
            let children = self.fetch_children(Some(&task.id)).await?;
            levels.push(HierarchyLevel::for_task(task, children));
        }

        self.view.hierarchy.replace(levels);
        debug!(task_id = %task_id, depth = self.view.hierarchy.len(), "navigated to task");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Details view
    // ---------------------------------------------------------------------

    pub fn open_details(&mut self, task_id: &str) -> StoreResult<&Task> {
        let task = self
            .local_task(task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))?;
        Ok(self.view.open_task.insert(task))
    }

    pub fn close_details(&mut self) {
        self.view.open_task = None;
    }

    // ---------------------------------------------------------------------
    // Derived views
    // ---------------------------------------------------------------------

    /// The displayed level split into the four quadrants.
    pub fn current_quadrants(&self) -> QuadrantBuckets {
        QuadrantBuckets::partition(self.current_tasks())
    }

    pub fn subtask_counts(&self, task_id: &str) -> SubtaskCounts {
        self.forest.subtask_counts(task_id)
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.forest.search(query)
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(&self.forest)
    }
}
