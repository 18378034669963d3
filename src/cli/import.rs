//! Import subcommand for eisenhower CLI

use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the snapshot file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Validate the snapshot and report what would be imported
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "append" }
    }
}
