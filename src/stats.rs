//! Aggregate statistics over the task forest.

use crate::forest::TaskForest;
use crate::types::Quadrant;
use serde::Serialize;

/// Totals for one quadrant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuadrantStats {
    pub quadrant: Option<Quadrant>,
    pub total: usize,
    pub completed: usize,
}

/// Overview numbers for the analytics view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub root_tasks: usize,
    pub tasks_with_notes: usize,
    pub max_depth: usize,
    /// Indexed by [`Quadrant::index`].
    pub by_quadrant: [QuadrantStats; 4],
}

impl Stats {
    pub fn collect(forest: &TaskForest) -> Self {
        let mut stats = Stats {
            root_tasks: forest.roots().count(),
            max_depth: forest.max_depth(),
            ..Default::default()
        };
        for quadrant in Quadrant::ALL {
            stats.by_quadrant[quadrant.index()].quadrant = Some(quadrant);
        }

        forest.walk(|task, _| {
            stats.total_tasks += 1;
            let bucket = &mut stats.by_quadrant[task.quadrant().index()];
            bucket.total += 1;
            if task.completed {
                stats.completed_tasks += 1;
                bucket.completed += 1;
            }
            if task.has_note() {
                stats.tasks_with_notes += 1;
            }
        });

        stats
    }

    /// Fraction of tasks completed, 0.0 for an empty forest.
    pub fn completion_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64
        }
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> &QuadrantStats {
        &self.by_quadrant[quadrant.index()]
    }
}
