//! Core types for the Eisenhower task store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque task identifier assigned by the persistence layer.
pub type TaskId = String;

/// One of the four Eisenhower matrix quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    UrgentImportant,
    UrgentNotImportant,
    NotUrgentImportant,
    NotUrgentNotImportant,
}

/// Label lookup table used by the "Add Task" action of each quadrant.
const QUADRANT_LABELS: [(&str, bool, bool); 4] = [
    ("Urgent & Important", true, true),
    ("Urgent & Not Important", true, false),
    ("Not Urgent & Important", false, true),
    ("Not Urgent & Not Important", false, false),
];

impl Quadrant {
    /// All quadrants in display order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::NotUrgentNotImportant,
    ];

    /// Classify an (urgent, important) pair.
    pub fn from_flags(urgent: bool, important: bool) -> Self {
        match (urgent, important) {
            (true, true) => Quadrant::UrgentImportant,
            (true, false) => Quadrant::UrgentNotImportant,
            (false, true) => Quadrant::NotUrgentImportant,
            (false, false) => Quadrant::NotUrgentNotImportant,
        }
    }

    /// Map a display label to its (urgent, important) pair.
    /// Unrecognized labels fall back to (false, false).
    pub fn flags_for_label(label: &str) -> (bool, bool) {
        QUADRANT_LABELS
            .iter()
            .find(|(name, _, _)| *name == label)
            .map(|(_, urgent, important)| (*urgent, *important))
            .unwrap_or((false, false))
    }

    /// Parse a display label. Unrecognized labels map to `NotUrgentNotImportant`.
    pub fn from_label(label: &str) -> Self {
        let (urgent, important) = Self::flags_for_label(label);
        Self::from_flags(urgent, important)
    }

    pub fn flags(self) -> (bool, bool) {
        match self {
            Quadrant::UrgentImportant => (true, true),
            Quadrant::UrgentNotImportant => (true, false),
            Quadrant::NotUrgentImportant => (false, true),
            Quadrant::NotUrgentNotImportant => (false, false),
        }
    }

    pub fn label(self) -> &'static str {
        QUADRANT_LABELS[self.index()].0
    }

    /// Position in [`Quadrant::ALL`].
    pub fn index(self) -> usize {
        match self {
            Quadrant::UrgentImportant => 0,
            Quadrant::UrgentNotImportant => 1,
            Quadrant::NotUrgentImportant => 2,
            Quadrant::NotUrgentNotImportant => 3,
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub urgent: bool,
    pub important: bool,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
}

impl Task {
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::from_flags(self.urgent, self.important)
    }

    pub fn has_note(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref notes) = patch.notes {
            self.notes = notes.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(urgent) = patch.urgent {
            self.urgent = urgent;
        }
        if let Some(important) = patch.important {
            self.important = important;
        }
    }
}

/// Insert payload. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub urgent: bool,
    pub important: bool,
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, quadrant: Quadrant, parent_id: Option<TaskId>) -> Self {
        let (urgent, important) = quadrant.flags();
        Self {
            title: title.into(),
            urgent,
            important,
            parent_id,
            completed: false,
            notes: None,
        }
    }
}

/// Partial update. `None` leaves a field untouched; `notes: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub completed: Option<bool>,
    pub urgent: Option<bool>,
    pub important: Option<bool>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn notes(notes: Option<String>) -> Self {
        Self {
            notes: Some(notes),
            ..Default::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn quadrant(quadrant: Quadrant) -> Self {
        let (urgent, important) = quadrant.flags();
        Self {
            urgent: Some(urgent),
            important: Some(important),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.completed.is_none()
            && self.urgent.is_none()
            && self.important.is_none()
    }
}

/// A task with its children, for overview and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub children: Vec<TaskTree>,
}

/// Display-only subtask badge counts for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskCounts {
    pub total: usize,
    pub completed: usize,
    /// Indexed by [`Quadrant::index`].
    pub by_quadrant: [usize; 4],
}

impl SubtaskCounts {
    pub fn pending(&self) -> usize {
        self.total - self.completed
    }

    pub fn in_quadrant(&self, quadrant: Quadrant) -> usize {
        self.by_quadrant[quadrant.index()]
    }
}

/// Tasks of one level split into the four quadrants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuadrantBuckets {
    pub buckets: [Vec<Task>; 4],
}

impl QuadrantBuckets {
    pub fn partition<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut buckets: [Vec<Task>; 4] = Default::default();
        for task in tasks {
            buckets[task.quadrant().index()].push(task.clone());
        }
        Self { buckets }
    }

    pub fn get(&self, quadrant: Quadrant) -> &[Task] {
        &self.buckets[quadrant.index()]
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(urgent: bool, important: bool) -> Task {
        Task {
            id: "t".to_string(),
            title: "t".to_string(),
            urgent,
            important,
            completed: false,
            notes: None,
            created_at: 0,
            parent_id: None,
        }
    }

    #[test]
    fn every_flag_pair_lands_in_exactly_one_quadrant() {
        for urgent in [true, false] {
            for important in [true, false] {
                let t = task(urgent, important);
                let predicates = [
                    t.urgent && t.important,
                    t.urgent && !t.important,
                    !t.urgent && t.important,
                    !t.urgent && !t.important,
                ];
                assert_eq!(predicates.iter().filter(|p| **p).count(), 1);
                assert!(predicates[t.quadrant().index()]);
            }
        }
    }

    #[test]
    fn label_table_maps_known_labels() {
        assert_eq!(Quadrant::flags_for_label("Urgent & Important"), (true, true));
        assert_eq!(Quadrant::flags_for_label("Urgent & Not Important"), (true, false));
        assert_eq!(Quadrant::flags_for_label("Not Urgent & Important"), (false, true));
        assert_eq!(
            Quadrant::flags_for_label("Not Urgent & Not Important"),
            (false, false)
        );
        for q in Quadrant::ALL {
            assert_eq!(Quadrant::from_label(q.label()), q);
        }
    }

    #[test]
    fn unknown_label_defaults_to_neither() {
        assert_eq!(Quadrant::flags_for_label("Someday"), (false, false));
        assert_eq!(Quadrant::from_label(""), Quadrant::NotUrgentNotImportant);
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut t = task(true, true);
        t.notes = Some("keep".to_string());
        t.apply(&TaskPatch::title("renamed"));
        assert_eq!(t.title, "renamed");
        assert_eq!(t.notes.as_deref(), Some("keep"));

        t.apply(&TaskPatch::notes(None));
        assert!(t.notes.is_none());

        t.apply(&TaskPatch::quadrant(Quadrant::NotUrgentImportant));
        assert_eq!(t.quadrant(), Quadrant::NotUrgentImportant);
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn partition_keeps_every_task() {
        let tasks = vec![task(true, true), task(false, true), task(false, true)];
        let buckets = QuadrantBuckets::partition(&tasks);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.get(Quadrant::NotUrgentImportant).len(), 2);
        assert!(buckets.get(Quadrant::UrgentNotImportant).is_empty());
    }
}
