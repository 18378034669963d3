//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::{BackendKind, Config};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "EISENHOWER_CONFIG_PATH";
pub const ENV_BACKEND: &str = "EISENHOWER_BACKEND";
pub const ENV_DB_PATH: &str = "EISENHOWER_DB_PATH";
pub const ENV_KV_PATH: &str = "EISENHOWER_KV_PATH";
pub const ENV_ROOT_TITLE: &str = "EISENHOWER_ROOT_TITLE";
pub const ENV_USER_DIR: &str = "EISENHOWER_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "EISENHOWER_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Project dir: `$EISENHOWER_PROJECT_DIR` or `./eisenhower`.
    /// User dir: `$EISENHOWER_USER_DIR` or `~/.eisenhower`.
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("eisenhower")));
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".eisenhower")));
        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, in merge order.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load from all tiers using process environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load with explicit paths and an environment lookup.
    pub fn load_with<E>(paths: ConfigPaths, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        if let Some(explicit) = env(ENV_CONFIG_PATH) {
            let path = PathBuf::from(explicit);
            let mut config = Config::load(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            Self::apply_env_overrides(&mut config, &env)?;
            return Ok(Self {
                paths,
                config,
                sources: vec![(ConfigTier::Environment, path)],
            });
        }

        let mut layers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        let tiers = [
            (ConfigTier::Project, paths.project_dir.clone()),
            (ConfigTier::User, paths.user_dir.clone()),
        ];
        for (tier, dir) in tiers {
            let Some(dir) = dir else { continue };
            let file = dir.join(CONFIG_FILE);
            if let Some(value) = read_yaml_layer(&file) {
                debug!(tier = %tier, path = %file.display(), "config layer loaded");
                layers.push(value);
                sources.push((tier, file));
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(layers))?;
        Self::apply_env_overrides(&mut config, &env)?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    fn apply_env_overrides<E>(config: &mut Config, env: &E) -> Result<()>
    where
        E: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = env(ENV_BACKEND) {
            config.store.backend = BackendKind::parse(&backend)?;
        }
        if let Some(db_path) = env(ENV_DB_PATH) {
            config.store.db_path = PathBuf::from(db_path);
        }
        if let Some(kv_path) = env(ENV_KV_PATH) {
            config.store.kv_path = PathBuf::from(kv_path);
        }
        if let Some(title) = env(ENV_ROOT_TITLE) {
            config.store.root_title = title;
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one YAML tier. Unreadable or malformed files are skipped with a warning.
fn read_yaml_layer(file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %file.display(), error = %e, "skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %file.display(), error = %e, "skipping malformed config file");
            None
        }
    }
}
