//! Client-side navigation through task levels.

use crate::types::{Task, TaskId};
use serde::Serialize;

/// One displayed "directory" of sibling tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyLevel {
    /// Parent task id, `None` for the root level.
    pub id: Option<TaskId>,
    pub title: String,
    pub tasks: Vec<Task>,
}

impl HierarchyLevel {
    pub fn root(title: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: None,
            title: title.into(),
            tasks,
        }
    }

    pub fn for_task(task: &Task, tasks: Vec<Task>) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: task.title.clone(),
            tasks,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// Ordered stack of levels; the last one is displayed.
///
/// Never persisted. Empty until the first load completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    levels: Vec<HierarchyLevel>,
}

impl Hierarchy {
    pub fn new(root: HierarchyLevel) -> Self {
        Self { levels: vec![root] }
    }

    pub fn levels(&self) -> &[HierarchyLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn current(&self) -> Option<&HierarchyLevel> {
        self.levels.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut HierarchyLevel> {
        self.levels.last_mut()
    }

    /// Id of the displayed level's parent task (`None` at the root or before load).
    pub fn current_id(&self) -> Option<&str> {
        self.current().and_then(|l| l.id.as_deref())
    }

    /// Breadcrumb titles, root first.
    pub fn breadcrumb(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.title.as_str()).collect()
    }

    pub fn push(&mut self, level: HierarchyLevel) {
        self.levels.push(level);
    }

    /// Drop the current level. The root level is never popped.
    pub fn pop(&mut self) -> bool {
        if self.levels.len() > 1 {
            self.levels.pop();
            true
        } else {
            false
        }
    }

    /// Keep levels `0..=index`. Out-of-range indexes are ignored.
    pub fn truncate_to(&mut self, index: usize) -> bool {
        if index < self.levels.len() {
            self.levels.truncate(index + 1);
            true
        } else {
            false
        }
    }

    /// Back to the root level only.
    pub fn reset(&mut self) {
        self.levels.truncate(1);
    }

    /// Forget deleted tasks: cut the stack back above the first level that
    /// belongs to a deleted task and drop the tasks from the levels left.
    /// Returns whether any level was cut.
    pub fn forget(&mut self, ids: &[TaskId]) -> bool {
        let cut = self
            .levels
            .iter()
            .position(|l| l.id.as_ref().is_some_and(|id| ids.contains(id)));
        if let Some(index) = cut {
            self.levels.truncate(index.max(1));
        }
        for level in &mut self.levels {
            level.tasks.retain(|t| !ids.contains(&t.id));
        }
        cut.is_some()
    }

    /// Replace the whole stack.
    pub fn replace(&mut self, levels: Vec<HierarchyLevel>) {
        self.levels = levels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            urgent: false,
            important: false,
            completed: false,
            notes: None,
            created_at: 0,
            parent_id: None,
        }
    }

    fn three_levels() -> Hierarchy {
        let mut h = Hierarchy::new(HierarchyLevel::root("Main Tasks", vec![task("1")]));
        h.push(HierarchyLevel::for_task(&task("1"), vec![task("2")]));
        h.push(HierarchyLevel::for_task(&task("2"), vec![task("3")]));
        h
    }

    #[test]
    fn push_and_breadcrumb() {
        let h = three_levels();
        assert_eq!(h.len(), 3);
        assert_eq!(h.current_id(), Some("2"));
        assert_eq!(h.breadcrumb(), vec!["Main Tasks", "Task 1", "Task 2"]);
    }

    #[test]
    fn pop_keeps_root() {
        let mut h = three_levels();
        assert!(h.pop());
        assert!(h.pop());
        assert!(!h.pop());
        assert_eq!(h.len(), 1);
        assert_eq!(h.current_id(), None);
    }

    #[test]
    fn truncate_to_breadcrumb() {
        let mut h = three_levels();
        assert!(!h.truncate_to(7));
        assert_eq!(h.len(), 3);
        assert!(h.truncate_to(1));
        assert_eq!(h.current_id(), Some("1"));
        h.reset();
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn forget_cuts_levels_of_deleted_tasks() {
        let mut h = three_levels();
        assert!(h.forget(&["2".to_string(), "3".to_string()]));
        assert_eq!(h.breadcrumb(), vec!["Main Tasks", "Task 1"]);
        assert!(h.current().unwrap().tasks.is_empty());

        assert!(h.forget(&["1".to_string()]));
        assert_eq!(h.len(), 1);
        assert!(h.current().unwrap().tasks.is_empty());
    }

    #[test]
    fn forget_without_open_levels_only_drops_tasks() {
        let mut h = three_levels();
        assert!(!h.forget(&["3".to_string()]));
        assert_eq!(h.len(), 3);
        assert!(h.current().unwrap().tasks.is_empty());
    }

    #[test]
    fn task_lookup_is_per_level() {
        let mut h = three_levels();
        assert!(h.current().unwrap().task("3").is_some());
        assert!(h.current().unwrap().task("1").is_none());
        h.current_mut().unwrap().task_mut("3").unwrap().completed = true;
        assert!(h.levels()[2].tasks[0].completed);
    }
}
