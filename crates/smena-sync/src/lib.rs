//! Reconciliation engine: merge planning, per-domain reconcilers and the
//! sync orchestrator.

pub mod carryover;
pub mod config;
pub mod engine;

pub const CRATE_NAME: &str = "smena-sync";

pub use config::{SyncConfig, DEFAULT_BRANCH};
pub use engine::{run_sync_once_from_env, SyncEngine};
