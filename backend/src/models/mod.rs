use sqlx::SqlitePool;

use crate::config::Config;

pub mod task;
pub mod task_completion;

pub use task::*;
pub use task_completion::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
