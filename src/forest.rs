//! Materialized task forest.
//!
//! Every task is stored once in an arena keyed by id; child lists are built
//! once from the parent-id index so tree walks never re-filter the full set.

use crate::types::{SubtaskCounts, Task, TaskId, TaskTree};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// All tasks linked into a forest by `parent_id`.
#[derive(Debug, Clone, Default)]
pub struct TaskForest {
    tasks: HashMap<TaskId, Task>,
    roots: Vec<TaskId>,
    children: HashMap<TaskId, Vec<TaskId>>,
}

/// A search match with the titles of its ancestors, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub task: Task,
    pub path: Vec<String>,
    /// Whether the match was in the notes rather than the title.
    pub in_notes: bool,
}

impl TaskForest {
    /// Link rows into a forest. Input order (creation order) is kept for
    /// siblings. Rows whose parent is missing become roots.
    pub fn build(rows: Vec<Task>) -> Self {
        let mut forest = TaskForest::default();
        let order: Vec<TaskId> = rows.iter().map(|t| t.id.clone()).collect();
        forest.tasks = rows.into_iter().map(|t| (t.id.clone(), t)).collect();

        for id in order.clone() {
            let Some(task) = forest.tasks.get(&id) else {
                continue;
            };
            match task.parent_id.as_ref() {
                Some(parent) if *parent != id && forest.tasks.contains_key(parent) => {
                    forest.children.entry(parent.clone()).or_default().push(id);
                }
                Some(parent) => {
                    warn!(task_id = %id, parent_id = %parent, "orphaned task attached as root");
                    forest.roots.push(id);
                }
                None => forest.roots.push(id),
            }
        }

        forest.break_cycles(&order);
        forest
    }

    /// Promote tasks caught in a parent cycle to roots so every row stays
    /// reachable. The first row of a cycle in creation order becomes the root.
    fn break_cycles(&mut self, order: &[TaskId]) {
        let mut reachable = HashSet::new();
        for root in &self.roots {
            self.mark_reachable(root, &mut reachable);
        }
        for id in order {
            if reachable.contains(id) {
                continue;
            }
            warn!(task_id = %id, "task in a parent cycle attached as root");
            for siblings in self.children.values_mut() {
                siblings.retain(|c| c != id);
            }
            self.roots.push(id.clone());
            self.mark_reachable(id, &mut reachable);
        }
    }

    fn mark_reachable(&self, id: &str, reachable: &mut HashSet<TaskId>) {
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if !reachable.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().cloned());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Task> {
        self.roots.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Direct children of `id`, or the roots for `None`.
    pub fn children_of(&self, id: Option<&str>) -> Vec<&Task> {
        match id {
            None => self.roots().collect(),
            Some(id) => self
                .children
                .get(id)
                .map(|ids| ids.iter().filter_map(|c| self.tasks.get(c)).collect())
                .unwrap_or_default(),
        }
    }

    /// All descendants of `id`, children before their parents.
    pub fn descendants(&self, id: &str) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([id.to_string()]);
        self.collect_post_order(id, &mut visited, &mut out);
        out
    }

    fn collect_post_order(&self, id: &str, visited: &mut HashSet<TaskId>, out: &mut Vec<TaskId>) {
        if let Some(children) = self.children.get(id) {
            for child in children {
                if !visited.insert(child.clone()) {
                    continue;
                }
                self.collect_post_order(child, visited, out);
                out.push(child.clone());
            }
        }
    }

    /// Ancestors of `id`, root first, excluding `id` itself.
    pub fn ancestors(&self, id: &str) -> Vec<&Task> {
        let mut chain = Vec::new();
        let mut cursor = self.tasks.get(id).and_then(|t| t.parent_id.as_deref());
        while let Some(parent_id) = cursor {
            let Some(parent) = self.tasks.get(parent_id) else {
                break;
            };
            // Guard against parent cycles in hand-edited data.
            if chain.iter().any(|t: &&Task| t.id == parent.id) || parent.id == id {
                break;
            }
            chain.push(parent);
            cursor = parent.parent_id.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Pre-order walk with depth (roots are depth 0).
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Task, usize),
    {
        for root in &self.roots {
            self.walk_from(root, 0, &mut visit);
        }
    }

    fn walk_from<F>(&self, id: &str, depth: usize, visit: &mut F)
    where
        F: FnMut(&Task, usize),
    {
        let Some(task) = self.tasks.get(id) else {
            return;
        };
        visit(task, depth);
        if let Some(children) = self.children.get(id) {
            for child in children {
                self.walk_from(child, depth + 1, visit);
            }
        }
    }

    /// Nested trees for every root.
    pub fn to_trees(&self) -> Vec<TaskTree> {
        self.roots.iter().filter_map(|id| self.tree_of(id)).collect()
    }

    /// Nested tree rooted at `id`.
    pub fn tree_of(&self, id: &str) -> Option<TaskTree> {
        let task = self.tasks.get(id)?.clone();
        let children = self
            .children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.tree_of(c)).collect())
            .unwrap_or_default();
        Some(TaskTree { task, children })
    }

    /// Badge counts over the direct subtasks of `id`.
    pub fn subtask_counts(&self, id: &str) -> SubtaskCounts {
        let mut counts = SubtaskCounts::default();
        for child in self.children_of(Some(id)) {
            counts.total += 1;
            if child.completed {
                counts.completed += 1;
            }
            counts.by_quadrant[child.quadrant().index()] += 1;
        }
        counts
    }

    /// Case-insensitive substring search over titles and notes.
    /// Results follow tree order. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        self.walk(|task, _| {
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_notes = !in_title
                && task
                    .notes
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle));
            if in_title || in_notes {
                hits.push(SearchHit {
                    task: task.clone(),
                    path: self.ancestors(&task.id).iter().map(|t| t.title.clone()).collect(),
                    in_notes,
                });
            }
        });
        hits
    }

    /// Depth of the deepest task (a single root level is depth 1).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        self.walk(|_, depth| max = max.max(depth + 1));
        max
    }
}
