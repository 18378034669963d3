//! Configuration.
//!
//! `config.yaml` files are merged field by field across tiers, lowest first:
//! 1. **Defaults** - built in
//! 2. **Project** - `./eisenhower/config.yaml`
//! 3. **User** - `~/.eisenhower/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `EISENHOWER_CONFIG_PATH` - Explicit config file (skips the file tiers)
//! - `EISENHOWER_BACKEND` - `sqlite` or `kv`
//! - `EISENHOWER_DB_PATH` - SQLite database path
//! - `EISENHOWER_KV_PATH` - Key-value blob directory
//! - `EISENHOWER_ROOT_TITLE` - Title of the root level
//! - `EISENHOWER_USER_DIR` / `EISENHOWER_PROJECT_DIR` - Tier directories

mod loader;
mod merge;
mod types;

pub use loader::{
    ConfigLoader, ConfigPaths, ConfigTier, ENV_BACKEND, ENV_CONFIG_PATH, ENV_DB_PATH, ENV_KV_PATH,
    ENV_ROOT_TITLE,
};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
