//! Output formatting utilities for markdown and JSON.

use crate::forest::{SearchHit, TaskForest};
use crate::stats::Stats;
use crate::types::{Quadrant, QuadrantBuckets, SubtaskCounts, Task};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Pretty-printed JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn checkbox(task: &Task) -> &'static str {
    if task.completed { "[x]" } else { "[ ]" }
}

/// Format a task in short form for lists.
fn format_task_short(task: &Task, counts: Option<&SubtaskCounts>) -> String {
    let subtasks = counts
        .filter(|c| c.total > 0)
        .map(|c| format!(" ({}/{} done)", c.completed, c.total))
        .unwrap_or_default();
    let note = if task.has_note() { " [note]" } else { "" };

    format!(
        "- {} {} `{}`{}{}\n",
        checkbox(task),
        task.title,
        task.id,
        subtasks,
        note,
    )
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task, counts: &SubtaskCounts) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **quadrant**: {}\n", task.quadrant()));
    md.push_str(&format!(
        "- **status**: {}\n",
        if task.completed { "completed" } else { "pending" }
    ));

    if let Some(ref parent_id) = task.parent_id {
        md.push_str(&format!("- **parent_id**: `{}`\n", parent_id));
    }

    if counts.total > 0 {
        md.push_str(&format!(
            "- **subtasks**: {} ({} pending)\n",
            counts.total,
            counts.pending()
        ));
    }

    if let Some(ref notes) = task.notes {
        md.push_str("\n### Notes\n");
        md.push_str(notes);
        md.push('\n');
    }

    md
}

/// Format one hierarchy level as a four-quadrant matrix.
pub fn format_level_markdown(
    breadcrumb: &[&str],
    buckets: &QuadrantBuckets,
    forest: &TaskForest,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {} ({})\n\n", breadcrumb.join(" > "), buckets.len()));

    for quadrant in Quadrant::ALL {
        let tasks = buckets.get(quadrant);
        md.push_str(&format!("## {} ({})\n\n", quadrant, tasks.len()));
        if tasks.is_empty() {
            md.push_str("_No tasks_\n");
        }
        for task in tasks {
            let counts = forest.subtask_counts(&task.id);
            md.push_str(&format_task_short(task, Some(&counts)));
        }
        md.push('\n');
    }

    md
}

/// Format the whole forest as an indented outline.
pub fn format_tree_markdown(forest: &TaskForest) -> String {
    let mut md = String::new();
    md.push_str(&format!("# All Tasks ({})\n\n", forest.len()));
    forest.walk(|task, depth| {
        md.push_str(&"  ".repeat(depth));
        md.push_str(&format!(
            "- {} {} `{}` _{}_\n",
            checkbox(task),
            task.title,
            task.id,
            task.quadrant()
        ));
    });
    md
}

pub fn format_search_markdown(query: &str, hits: &[SearchHit]) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Search: \"{}\" ({})\n\n", query, hits.len()));
    for hit in hits {
        let location = if hit.path.is_empty() {
            String::new()
        } else {
            format!(" in {}", hit.path.join(" > "))
        };
        let field = if hit.in_notes { " (notes)" } else { "" };
        md.push_str(&format!(
            "- {} {} `{}`{}{}\n",
            checkbox(&hit.task),
            hit.task.title,
            hit.task.id,
            location,
            field
        ));
    }
    md
}

pub fn format_stats_markdown(stats: &Stats) -> String {
    let mut md = String::new();

    md.push_str("# Task Statistics\n\n");
    md.push_str(&format!("- **total**: {}\n", stats.total_tasks));
    md.push_str(&format!(
        "- **completed**: {} ({:.0}%)\n",
        stats.completed_tasks,
        stats.completion_rate() * 100.0
    ));
    md.push_str(&format!("- **top level**: {}\n", stats.root_tasks));
    md.push_str(&format!("- **with notes**: {}\n", stats.tasks_with_notes));
    md.push_str(&format!("- **max depth**: {}\n", stats.max_depth));

    md.push_str("\n## By Quadrant\n\n");
    md.push_str("| Quadrant | Total | Completed |\n|---|---|---|\n");
    for quadrant in Quadrant::ALL {
        let q = stats.quadrant(quadrant);
        md.push_str(&format!("| {} | {} | {} |\n", quadrant, q.total, q.completed));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str, quadrant: Quadrant, parent: Option<&str>) -> Task {
        let (urgent, important) = quadrant.flags();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            urgent,
            important,
            completed: false,
            notes: None,
            created_at: 0,
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn parse_output_format() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn level_lists_every_quadrant() {
        let rows = vec![
            task("a", "Ship release", Quadrant::UrgentImportant, None),
            task("b", "Write tests", Quadrant::UrgentImportant, Some("a")),
        ];
        let forest = TaskForest::build(rows.clone());
        let buckets = QuadrantBuckets::partition(rows.iter().take(1));
        let md = format_level_markdown(&["Main Tasks"], &buckets, &forest);

        assert!(md.starts_with("# Main Tasks (1)"));
        assert!(md.contains("## Urgent & Important (1)"));
        assert!(md.contains("Ship release `a` (0/1 done)"));
        assert_eq!(md.matches("_No tasks_").count(), 3);
    }

    #[test]
    fn tree_indents_children() {
        let forest = TaskForest::build(vec![
            task("a", "Parent", Quadrant::UrgentImportant, None),
            task("b", "Child", Quadrant::NotUrgentImportant, Some("a")),
        ]);
        let md = format_tree_markdown(&forest);
        assert!(md.contains("\n- [ ] Parent `a`"));
        assert!(md.contains("\n  - [ ] Child `b` _Not Urgent & Important_"));
    }
}
