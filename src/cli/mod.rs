//! CLI command definitions for eisenhower
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod import;

use crate::config::BackendKind;
use crate::format::OutputFormat;
use crate::types::Quadrant;
use clap::{Parser, Subcommand};
use export::ExportArgs;
use import::ImportArgs;

/// Eisenhower matrix task manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Storage backend: sqlite or kv (overrides config)
    #[arg(short, long, global = true, value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Output format (overrides config)
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one level of the matrix (default if no subcommand given)
    List {
        /// Show the subtasks of this task instead of the top level
        #[arg(short, long, value_name = "ID")]
        parent: Option<String>,
    },

    /// Show every task as an indented outline
    Tree,

    /// Show one task with its notes and subtask counts
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Create a task
    Add {
        title: String,

        /// do | schedule | delegate | eliminate, or a full quadrant label
        #[arg(short, long, value_parser = parse_quadrant)]
        quadrant: Quadrant,

        /// Create as a subtask of this task
        #[arg(short, long, value_name = "ID")]
        parent: Option<String>,
    },

    /// Change a task's title
    Rename {
        #[arg(value_name = "ID")]
        id: String,
        title: String,
    },

    /// Replace a task's note (empty text clears it)
    Note {
        #[arg(value_name = "ID")]
        id: String,
        text: String,
    },

    /// Flip a task between pending and completed
    Toggle {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Move a task to another quadrant
    Move {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(short, long, value_parser = parse_quadrant)]
        quadrant: Quadrant,
    },

    /// Delete a task and all of its subtasks
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Search titles and notes
    Search { query: String },

    /// Show completion statistics
    Stats,

    /// Export every task to a JSON snapshot
    Export(ExportArgs),

    /// Import tasks from a JSON snapshot
    Import(ImportArgs),
}

/// Parse a quadrant from a short name or its display label.
///
/// `q1`..`q4` follow the usual matrix numbering: do, schedule, delegate, eliminate.
pub fn parse_quadrant(s: &str) -> Result<Quadrant, String> {
    let normalized = s.trim().to_lowercase().replace(['-', '_', ' '], "");
    match normalized.as_str() {
        "do" | "urgentimportant" | "ui" | "q1" => Ok(Quadrant::UrgentImportant),
        "delegate" | "urgentnotimportant" | "un" | "q3" => Ok(Quadrant::UrgentNotImportant),
        "schedule" | "noturgentimportant" | "ni" | "q2" => Ok(Quadrant::NotUrgentImportant),
        "eliminate" | "noturgentnotimportant" | "nn" | "q4" => {
            Ok(Quadrant::NotUrgentNotImportant)
        }
        _ => Quadrant::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown quadrant '{}'. Expected do, schedule, delegate, eliminate or a label such as \"Urgent & Important\"",
                    s
                )
            }),
    }
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    BackendKind::parse(s).map_err(|e| e.to_string())
}
