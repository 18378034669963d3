//! Export subcommand for eisenhower CLI
//!
//! Writes every task to a JSON snapshot that can be version-controlled,
//! diffed, and re-imported into either backend.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
