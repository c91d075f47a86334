//! Day-planner task engine: a two-level task hierarchy (tasks and subtasks)
//! assigned to calendar days, stored in SQLite, queryable by day or status.
//!
//! The crate exposes [`Planner`] as the owner-scoped operations facade; HTTP
//! routing and caller authentication are the embedding application's concern.

pub mod db;
pub mod errors;
pub mod hierarchy;
pub mod models;
pub mod planner;

pub use crate::errors::{AppError, AppResult};
pub use crate::planner::Planner;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Sets up daily-rolling JSON logs under `<data_dir>/logs`, filtered by
/// `RUST_LOG` (default `info`). Call once at application startup.
pub fn init_tracing(data_dir: &Path) -> Result<(), String> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "planner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
