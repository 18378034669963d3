//! Eisenhower matrix task store.
//!
//! A hierarchical task list where every task sits in one of four
//! urgency/importance quadrants and may hold subtasks of its own. The
//! [`store::TaskStore`] mediates between user actions and a pluggable
//! [`backend::TaskBackend`] (SQLite or a key-value blob).

pub mod backend;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod forest;
pub mod format;
pub mod logging;
pub mod stats;
pub mod store;
pub mod types;
