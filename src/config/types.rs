//! Configuration types.

use crate::format::OutputFormat;
use crate::store::DEFAULT_ROOT_TITLE;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which persistence collaborator backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// SQLite `tasks` table (default).
    #[default]
    Sqlite,
    /// Single nested-tree blob in a key-value directory.
    Kv,
}

impl BackendKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            "kv" | "blob" => Ok(BackendKind::Kv),
            other => Err(anyhow!("Unknown backend '{}'. Expected 'sqlite' or 'kv'", other)),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Store and backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding the key-value blobs.
    #[serde(default = "default_kv_path")]
    pub kv_path: PathBuf,

    /// Title of the root hierarchy level.
    #[serde(default = "default_root_title")]
    pub root_title: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_path: default_db_path(),
            kv_path: default_kv_path(),
            root_title: default_root_title(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("eisenhower/tasks.db")
}

fn default_kv_path() -> PathBuf {
    PathBuf::from("eisenhower/kv")
}

fn default_root_title() -> String {
    DEFAULT_ROOT_TITLE.to_string()
}

/// CLI output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format (markdown or json).
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
